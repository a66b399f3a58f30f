use thiserror::Error;

use crate::grading::GradingError;
use crate::model::{CourseError, IdError, ProgressError, QuizError, SearchHitError};

/// Umbrella error for callers that do not care which validation failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Search(#[from] SearchHitError),
    #[error(transparent)]
    Grading(#[from] GradingError),
}
