use std::sync::Arc;

use companion_core::grading;
use companion_core::model::{
    Answers, CourseId, Quiz, QuizAttempt, QuizId, QuizResult, QuizSubmission, UserId,
};
use storage::repository::{QuizRepository, SubmittedQuiz};

use crate::error::{QuizServiceError, QuizSessionError};
use crate::quiz_session::{QuizSession, QuizSessionState};

const SCORE_TOLERANCE: f64 = 1e-9;

/// What the store decided for a submission, next to what the client computed.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub verdict: SubmittedQuiz,
    pub local: QuizResult,
}

impl SubmissionOutcome {
    /// True when the local preview matches the store's verdict.
    #[must_use]
    pub fn agrees(&self) -> bool {
        self.verdict.passed == self.local.passed
            && (self.verdict.score - self.local.score).abs() < SCORE_TOLERANCE
    }
}

/// Loads quizzes, grades them locally and hands submissions to the store.
#[derive(Clone)]
pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { quizzes }
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the quiz cannot be fetched.
    pub async fn load_quiz(&self, id: &QuizId) -> Result<Quiz, QuizServiceError> {
        let quiz = self.quizzes.get_quiz(id).await?;
        Ok(quiz)
    }

    /// Load a quiz and open a session on it.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the quiz cannot be fetched.
    pub async fn start_session(&self, id: &QuizId) -> Result<QuizSession, QuizServiceError> {
        let mut session = QuizSession::new(self.load_quiz(id).await?);
        session.start()?;
        Ok(session)
    }

    /// Score answers without contacting the store.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Grading` if the quiz has no questions.
    pub fn grade_locally(
        &self,
        quiz: &Quiz,
        answers: &Answers,
    ) -> Result<QuizResult, QuizServiceError> {
        Ok(grading::grade(quiz, answers)?)
    }

    /// Send a submitted session to the store for the authoritative verdict.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` if the session has not been submitted.
    /// Returns `QuizServiceError::Storage` if the store rejects the submission.
    pub async fn submit(
        &self,
        user_id: &UserId,
        session: &QuizSession,
    ) -> Result<SubmissionOutcome, QuizServiceError> {
        let local = match (session.state(), session.result()) {
            (QuizSessionState::Submitted, Some(result)) => result.clone(),
            _ => return Err(QuizSessionError::NotSubmitted.into()),
        };

        let submission = QuizSubmission {
            user_id: user_id.clone(),
            quiz_id: session.quiz().id().clone(),
            answers: session.answers().clone(),
        };
        let verdict = self.quizzes.submit_quiz(&submission).await?;
        let outcome = SubmissionOutcome { verdict, local };

        if !outcome.agrees() {
            tracing::warn!(
                user = %user_id,
                quiz = %submission.quiz_id,
                local_score = outcome.local.score,
                store_score = outcome.verdict.score,
                "store grade differs from local preview"
            );
        }
        tracing::info!(
            user = %user_id,
            quiz = %submission.quiz_id,
            passed = outcome.verdict.passed,
            "quiz submitted"
        );
        Ok(outcome)
    }

    /// Past attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if attempts cannot be read.
    pub async fn attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizAttempt>, QuizServiceError> {
        let attempts = self.quizzes.list_attempts(user_id, quiz_id).await?;
        Ok(attempts)
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if quizzes cannot be listed.
    pub async fn course_quizzes(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Quiz>, QuizServiceError> {
        let quizzes = self.quizzes.list_course_quizzes(user_id, course_id).await?;
        Ok(quizzes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::model::QuestionId;
    use storage::repository::{InMemoryRepository, StorageError};
    use storage::seed;

    fn service() -> QuizService {
        let repo = InMemoryRepository::new().with_sample_content().unwrap();
        QuizService::new(Arc::new(repo))
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn quiz_id() -> QuizId {
        QuizId::new(seed::SAMPLE_QUIZ_ID).unwrap()
    }

    #[tokio::test]
    async fn submit_requires_graded_session() {
        let svc = service();
        let session = svc.start_session(&quiz_id()).await.unwrap();
        let err = svc.submit(&user(), &session).await.unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Session(QuizSessionError::NotSubmitted)
        ));
    }

    #[tokio::test]
    async fn store_and_local_agree_on_sample_quiz() {
        let svc = service();
        let mut session = svc.start_session(&quiz_id()).await.unwrap();
        session
            .answer(&QuestionId::new("q1").unwrap(), "x = 5")
            .unwrap();
        session
            .answer(&QuestionId::new("q2").unwrap(), "function my_func():")
            .unwrap();
        session.submit().unwrap();

        let outcome = svc.submit(&user(), &session).await.unwrap();
        assert!(outcome.agrees());
        assert!(!outcome.verdict.passed);
        assert!((outcome.verdict.score - 0.5).abs() < f64::EPSILON);

        let attempts = svc.attempts(&user(), &quiz_id()).await.unwrap();
        assert_eq!(attempts.len(), 1);
    }

    #[tokio::test]
    async fn course_quizzes_filters_by_course() {
        let svc = service();
        let quizzes = svc
            .course_quizzes(&user(), &seed::sample_course_id())
            .await
            .unwrap();
        assert_eq!(quizzes.len(), 1);

        let none = svc
            .course_quizzes(&user(), &CourseId::new("other").unwrap())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let svc = service();
        let err = svc
            .load_quiz(&QuizId::new("missing").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizServiceError::Storage(StorageError::NotFound)));
    }

    #[test]
    fn grade_locally_matches_grader() {
        let svc = service();
        let quiz = seed::sample_quiz();
        let result = svc.grade_locally(&quiz, &Answers::new()).unwrap();
        assert_eq!(result.correct_answers, 0);
        assert!(!result.passed);
    }
}
