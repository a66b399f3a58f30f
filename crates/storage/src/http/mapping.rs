//! Wire shapes of the backend API and their conversion into domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use companion_core::model::{
    Answers, Chapter, ChapterId, Course, CourseId, DEFAULT_PASSING_SCORE, Question, QuestionId,
    Quiz, QuizAttempt, QuizId, QuizScore, SearchHit, SearchKind, UserId,
};
use serde::{Deserialize, Serialize};

use crate::repository::{ProgressRecord, StorageError, SubmittedQuiz};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Parse a backend timestamp.
///
/// The backend emits naive UTC (`2024-05-01T10:00:00.123456`) as well as RFC 3339.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| StorageError::Serialization(format!("invalid timestamp: {raw}")))
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct CourseListDto {
    pub courses: Vec<CourseDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub chapters: Option<Vec<ChapterDto>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterListDto {
    pub chapters: Vec<ChapterDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub next_chapter_id: Option<String>,
    #[serde(default)]
    pub prev_chapter_id: Option<String>,
}

fn optional_chapter_id(raw: Option<String>) -> Result<Option<ChapterId>, StorageError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(ChapterId::new)
        .transpose()
        .map_err(ser)
}

impl ChapterDto {
    pub(crate) fn into_chapter(self) -> Result<Chapter, StorageError> {
        let next = optional_chapter_id(self.next_chapter_id)?;
        let previous = optional_chapter_id(self.prev_chapter_id)?;
        Ok(
            Chapter::new(ChapterId::new(self.id).map_err(ser)?, self.title, self.content, self.order)
                .map_err(ser)?
                .with_links(next, previous),
        )
    }
}

pub(crate) fn map_chapters(dtos: Vec<ChapterDto>) -> Result<Vec<Chapter>, StorageError> {
    dtos.into_iter().map(ChapterDto::into_chapter).collect()
}

impl CourseDto {
    pub(crate) fn into_course(self) -> Result<Course, StorageError> {
        let prerequisites = self
            .prerequisites
            .into_iter()
            .map(CourseId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ser)?;
        let course = Course::new(CourseId::new(self.id).map_err(ser)?, self.title, self.description)
            .map_err(ser)?
            .with_prerequisites(prerequisites);
        match self.chapters {
            Some(chapters) => course.with_chapters(map_chapters(chapters)?).map_err(ser),
            None => Ok(course),
        }
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct QuizScoreDto {
    pub score: f64,
    pub passed: bool,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressDto {
    pub user_id: String,
    pub course_id: String,
    #[serde(default)]
    pub completed_chapters: Vec<String>,
    #[serde(default)]
    pub quiz_scores: BTreeMap<String, QuizScoreDto>,
    pub last_accessed: String,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarkCompleteDto {
    pub progress: ProgressDto,
}

impl ProgressDto {
    pub(crate) fn into_record(self) -> Result<ProgressRecord, StorageError> {
        let completed_chapters = self
            .completed_chapters
            .into_iter()
            .map(ChapterId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ser)?;

        let mut quiz_scores = BTreeMap::new();
        for (quiz_id, dto) in self.quiz_scores {
            let recorded_at = dto.date.as_deref().map(parse_timestamp).transpose()?;
            let score = QuizScore::new(dto.score, dto.passed, recorded_at).map_err(ser)?;
            quiz_scores.insert(QuizId::new(quiz_id).map_err(ser)?, score);
        }

        Ok(ProgressRecord {
            user_id: UserId::new(self.user_id).map_err(ser)?,
            course_id: CourseId::new(self.course_id).map_err(ser)?,
            completed_chapters,
            quiz_scores,
            last_accessed: parse_timestamp(&self.last_accessed)?,
            streak_days: self.streak_days,
            reported_percentage: self.completion_percentage,
        })
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

fn default_passing_score() -> f64 {
    DEFAULT_PASSING_SCORE
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDto {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub course_id: String,
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
}

impl QuizDto {
    pub(crate) fn into_quiz(self) -> Result<Quiz, StorageError> {
        let questions = self
            .questions
            .into_iter()
            .map(|q| {
                Question::new(
                    QuestionId::new(q.id).map_err(ser)?,
                    q.question,
                    q.options,
                    q.correct_answer,
                )
                .map_err(ser)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let quiz = Quiz::new(
            QuizId::new(self.id).map_err(ser)?,
            self.title,
            CourseId::new(self.course_id).map_err(ser)?,
            questions,
            self.passing_score,
        )
        .map_err(ser)?
        .with_description(self.description);

        Ok(match self.course_title {
            Some(title) => quiz.with_course_title(title),
            None => quiz,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub user_id: &'a str,
    pub quiz_id: &'a str,
    pub answers: BTreeMap<&'a str, &'a str>,
}

impl<'a> SubmitRequest<'a> {
    pub(crate) fn new(user_id: &'a UserId, quiz_id: &'a QuizId, answers: &'a Answers) -> Self {
        Self {
            user_id: user_id.as_str(),
            quiz_id: quiz_id.as_str(),
            answers: answers
                .iter()
                .map(|(q, a)| (q.as_str(), a.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponseDto {
    pub quiz_id: String,
    pub score: f64,
    pub passed: bool,
    #[serde(default)]
    pub feedback: String,
}

impl SubmitResponseDto {
    pub(crate) fn into_submitted(self) -> Result<SubmittedQuiz, StorageError> {
        if !self.score.is_finite() || !(0.0..=1.0).contains(&self.score) {
            return Err(StorageError::Serialization(format!(
                "score out of range: {}",
                self.score
            )));
        }
        Ok(SubmittedQuiz {
            quiz_id: QuizId::new(self.quiz_id).map_err(ser)?,
            score: self.score,
            passed: self.passed,
            feedback: self.feedback,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptDto {
    pub user_id: String,
    pub quiz_id: String,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    pub score: f64,
    pub passed: bool,
    pub completed_at: String,
}

impl AttemptDto {
    pub(crate) fn into_attempt(self) -> Result<QuizAttempt, StorageError> {
        let answers = self
            .answers
            .into_iter()
            .map(|(q, a)| QuestionId::new(q).map(|q| (q, a)))
            .collect::<Result<Answers, _>>()
            .map_err(ser)?;
        Ok(QuizAttempt {
            user_id: UserId::new(self.user_id).map_err(ser)?,
            quiz_id: QuizId::new(self.quiz_id).map_err(ser)?,
            answers,
            score: self.score,
            passed: self.passed,
            completed_at: parse_timestamp(&self.completed_at)?,
        })
    }
}

//
// ─── SEARCH ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponseDto {
    pub results: Vec<SearchHitDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHitDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(alias = "relevance_score")]
    pub relevance: f64,
}

pub(crate) fn parse_search_kind(raw: &str) -> Result<SearchKind, StorageError> {
    match raw {
        "course" => Ok(SearchKind::Course),
        "chapter" => Ok(SearchKind::Chapter),
        other => Err(StorageError::Serialization(format!(
            "invalid search hit type: {other}"
        ))),
    }
}

impl SearchHitDto {
    pub(crate) fn into_hit(self) -> Result<SearchHit, StorageError> {
        let kind = parse_search_kind(&self.kind)?;
        let mut hit = SearchHit::new(kind, self.id, self.title, self.relevance).map_err(ser)?;
        if let Some(description) = self.description {
            hit = hit.with_description(description);
        }
        if let Some(course_id) = self.course_id {
            hit = hit.with_course(course_id, self.course_title);
        }
        Ok(hit)
    }
}
