//! Persistence adapters for the course companion.
//!
//! `repository` holds the contracts and the in-memory adapter, `http` talks
//! to the backend API, `seed` provides sample content for offline use.

pub mod http;
pub mod repository;
pub mod seed;

pub use http::{HttpConfig, HttpInitError, HttpRepository};
pub use repository::{
    CourseRepository, InMemoryRepository, ProgressRecord, ProgressRepository, QuizRepository,
    SearchRepository, Storage, StorageError, SubmittedQuiz,
};
