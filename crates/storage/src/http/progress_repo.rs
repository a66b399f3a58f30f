use async_trait::async_trait;
use companion_core::model::{ChapterId, CourseId, UserId};

use super::HttpRepository;
use super::mapping::{MarkCompleteDto, ProgressDto};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for HttpRepository {
    async fn get_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<ProgressRecord, StorageError> {
        let url = self.endpoint(&["progress", user_id.as_str(), "courses", course_id.as_str()])?;
        let dto: ProgressDto = self.get_json(url).await?;
        dto.into_record()
    }

    async fn mark_chapter_complete(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<ProgressRecord, StorageError> {
        let url = self.endpoint(&[
            "progress",
            user_id.as_str(),
            "courses",
            course_id.as_str(),
            "chapters",
            chapter_id.as_str(),
        ])?;
        let response: MarkCompleteDto = self.post_json::<(), _>(url, None).await?;
        tracing::info!(
            user = %user_id,
            course = %course_id,
            chapter = %chapter_id,
            "chapter marked complete"
        );
        response.progress.into_record()
    }

    async fn reset_streak(&self, user_id: &UserId) -> Result<(), StorageError> {
        let url = self.endpoint(&["progress", user_id.as_str(), "streak", "reset"])?;
        self.put_empty(url).await
    }
}
