use std::sync::Arc;

use storage::http::HttpConfig;
use storage::repository::{InMemoryRepository, Storage};

use crate::Clock;
use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::search_service::SearchService;

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    courses: Arc<CourseService>,
    progress: Arc<ProgressService>,
    quizzes: Arc<QuizService>,
    search: Arc<SearchService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        let courses = Arc::new(CourseService::new(Arc::clone(&storage.courses)));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.progress),
        ));
        let quizzes = Arc::new(QuizService::new(Arc::clone(&storage.quizzes)));
        let search = Arc::new(SearchService::new(Arc::clone(&storage.search)));
        Self {
            courses,
            progress,
            quizzes,
            search,
        }
    }

    /// Build services backed by the HTTP store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Http` if the HTTP client cannot be built.
    pub fn new_http(config: &HttpConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::http(config)?;
        Ok(Self::new(&storage, clock))
    }

    /// Build services over an in-memory store seeded with sample content.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if seeding fails.
    pub fn new_offline(clock: Clock) -> Result<Self, AppServicesError> {
        let repo = InMemoryRepository::new()
            .with_clock(clock)
            .with_sample_content()?;
        Ok(Self::new(&Storage::from_repository(repo), clock))
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn search(&self) -> Arc<SearchService> {
        Arc::clone(&self.search)
    }
}
