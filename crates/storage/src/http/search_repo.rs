use async_trait::async_trait;
use companion_core::model::{SearchHit, SearchScope};

use super::HttpRepository;
use super::mapping::{SearchHitDto, SearchResponseDto};
use crate::repository::{SearchRepository, StorageError};

#[async_trait]
impl SearchRepository for HttpRepository {
    async fn search(
        &self,
        query: &str,
        scope: SearchScope,
        limit: u32,
    ) -> Result<Vec<SearchHit>, StorageError> {
        let segments: &[&str] = match scope {
            SearchScope::All => &["search", ""],
            SearchScope::Courses => &["search", "courses"],
            SearchScope::Chapters => &["search", "chapters"],
        };
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.to_string());

        let response: SearchResponseDto = self.get_json(url).await?;
        let mut hits = response
            .results
            .into_iter()
            .map(SearchHitDto::into_hit)
            .collect::<Result<Vec<_>, _>>()?;
        hits.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
        hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(hits)
    }
}
