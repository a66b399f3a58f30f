mod course;
mod ids;
mod progress;
mod quiz;
mod search;

pub use ids::{ChapterId, CourseId, IdError, QuestionId, QuizId, UserId};

pub use course::{Chapter, Course, CourseError};
pub use progress::{ProgressError, QuizScore, UserProgress};
pub use quiz::{
    Answers, DEFAULT_PASSING_SCORE, Question, Quiz, QuizAttempt, QuizError, QuizResult,
    QuizSubmission,
};
pub use search::{SearchHit, SearchHitError, SearchKind, SearchScope};
