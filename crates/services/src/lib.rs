#![forbid(unsafe_code)]

pub mod app_services;
pub mod course_service;
pub mod error;
pub mod progress_service;
pub mod quiz_service;
pub mod quiz_session;
pub mod search_service;

pub use companion_core::Clock;

pub use app_services::AppServices;
pub use course_service::{ChapterView, CourseService};
pub use error::{
    AppServicesError, CourseServiceError, ProgressServiceError, QuizServiceError,
    QuizSessionError, SearchError,
};
pub use progress_service::{
    ChapterCompletion, CourseOverviewRow, CourseProgressView, ProgressOverview, ProgressService,
};
pub use quiz_service::{QuizService, SubmissionOutcome};
pub use quiz_session::{QuizSession, QuizSessionState};
pub use search_service::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, SearchService};
