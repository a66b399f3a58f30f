//! Shared error types for the services crate.

use thiserror::Error;

use companion_core::grading::GradingError;
use companion_core::model::{ChapterId, CourseError, CourseId, QuestionId};
use storage::http::HttpInitError;
use storage::repository::StorageError;

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("chapter {chapter} is not part of course {course}")]
    ChapterNotInCourse { course: CourseId, chapter: ChapterId },
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizSession` transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("quiz session has already been started")]
    AlreadyStarted,
    #[error("quiz session is not in progress")]
    NotInProgress,
    #[error("quiz session has not been submitted")]
    NotSubmitted,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("{option:?} is not an option for question {question}")]
    InvalidOption { question: QuestionId, option: String },
    #[error("{answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
    #[error(transparent)]
    Grading(#[from] GradingError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SearchService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SearchError {
    #[error("search query cannot be empty")]
    EmptyQuery,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Http(#[from] HttpInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
