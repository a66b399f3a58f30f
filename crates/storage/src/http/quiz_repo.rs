use async_trait::async_trait;
use companion_core::model::{CourseId, Quiz, QuizAttempt, QuizId, QuizSubmission, UserId};

use super::HttpRepository;
use super::mapping::{AttemptDto, QuizDto, SubmitRequest, SubmitResponseDto};
use crate::repository::{QuizRepository, StorageError, SubmittedQuiz};

#[async_trait]
impl QuizRepository for HttpRepository {
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let url = self.endpoint(&["quizzes", id.as_str()])?;
        let dto: QuizDto = self.get_json(url).await?;
        dto.into_quiz()
    }

    async fn list_course_quizzes(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let url = self.endpoint(&[
            "quizzes",
            "user",
            user_id.as_str(),
            "course",
            course_id.as_str(),
        ])?;
        let dtos: Vec<QuizDto> = self.get_json(url).await?;
        dtos.into_iter().map(QuizDto::into_quiz).collect()
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<SubmittedQuiz, StorageError> {
        let url = self.endpoint(&["quizzes", "submit"])?;
        let body = SubmitRequest::new(
            &submission.user_id,
            &submission.quiz_id,
            &submission.answers,
        );
        let response: SubmitResponseDto = self.post_json(url, Some(&body)).await?;
        response.into_submitted()
    }

    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let url = self.endpoint(&["quizzes", "attempts", user_id.as_str(), quiz_id.as_str()])?;
        let dtos: Vec<AttemptDto> = self.get_json(url).await?;
        let mut attempts = dtos
            .into_iter()
            .map(AttemptDto::into_attempt)
            .collect::<Result<Vec<_>, _>>()?;
        attempts.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(attempts)
    }
}
