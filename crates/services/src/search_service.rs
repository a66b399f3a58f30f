use std::sync::Arc;

use companion_core::model::{SearchHit, SearchScope};
use storage::repository::SearchRepository;

use crate::error::SearchError;

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// Proxies full-text search to the store. Ranking is the store's business.
#[derive(Clone)]
pub struct SearchService {
    search: Arc<dyn SearchRepository>,
}

impl SearchService {
    #[must_use]
    pub fn new(search: Arc<dyn SearchRepository>) -> Self {
        Self { search }
    }

    /// Search courses and/or chapters.
    ///
    /// `limit` defaults to 10 and is clamped to `1..=50`.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::EmptyQuery` for a blank query.
    /// Returns `SearchError::Storage` if the store fails.
    pub async fn search(
        &self,
        query: &str,
        scope: SearchScope,
        limit: Option<u32>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        tracing::debug!(query, scope = %scope, limit, "search");
        let hits = self.search.search(query, scope, limit).await?;
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use storage::repository::{InMemoryRepository, StorageError};

    #[derive(Default)]
    struct RecordingSearch {
        calls: Mutex<Vec<(String, SearchScope, u32)>>,
    }

    #[async_trait]
    impl SearchRepository for RecordingSearch {
        async fn search(
            &self,
            query: &str,
            scope: SearchScope,
            limit: u32,
        ) -> Result<Vec<SearchHit>, StorageError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_owned(), scope, limit));
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let svc = SearchService::new(Arc::new(InMemoryRepository::new()));
        let err = svc.search("   ", SearchScope::All, None).await.unwrap_err();
        assert!(matches!(err, SearchError::EmptyQuery));
    }

    #[tokio::test]
    async fn query_is_trimmed_and_limit_clamped() {
        let repo = Arc::new(RecordingSearch::default());
        let svc = SearchService::new(repo.clone());

        svc.search("  rust ", SearchScope::Courses, None).await.unwrap();
        svc.search("rust", SearchScope::All, Some(0)).await.unwrap();
        svc.search("rust", SearchScope::Chapters, Some(500)).await.unwrap();

        let calls = repo.calls.lock().unwrap();
        assert_eq!(calls[0], ("rust".to_owned(), SearchScope::Courses, 10));
        assert_eq!(calls[1].2, 1);
        assert_eq!(calls[2].2, 50);
    }

    #[tokio::test]
    async fn searches_seeded_content() {
        let repo = InMemoryRepository::new().with_sample_content().unwrap();
        let svc = SearchService::new(Arc::new(repo));
        let hits = svc
            .search("functions", SearchScope::Chapters, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "ch-python-functions");
    }
}
