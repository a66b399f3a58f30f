use async_trait::async_trait;
use companion_core::model::{Chapter, ChapterId, Course, CourseId};

use super::HttpRepository;
use super::mapping::{ChapterDto, ChapterListDto, CourseDto, CourseListDto, map_chapters};
use crate::repository::{CourseRepository, StorageError};

#[async_trait]
impl CourseRepository for HttpRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let url = self.endpoint(&["courses", ""])?;
        let list: CourseListDto = self.get_json(url).await?;
        list.courses
            .into_iter()
            .map(|dto| dto.into_course().map(|c| c.without_chapters()))
            .collect()
    }

    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError> {
        let url = self.endpoint(&["courses", id.as_str()])?;
        let dto: CourseDto = self.get_json(url).await?;
        dto.into_course()
    }

    async fn list_chapters(&self, course_id: &CourseId) -> Result<Vec<Chapter>, StorageError> {
        let url = self.endpoint(&["courses", course_id.as_str(), "chapters"])?;
        let list: ChapterListDto = self.get_json(url).await?;
        let mut chapters = map_chapters(list.chapters)?;
        chapters.sort_by_key(Chapter::order);
        Ok(chapters)
    }

    async fn get_chapter(&self, id: &ChapterId) -> Result<Chapter, StorageError> {
        let url = self.endpoint(&["courses", "chapters", id.as_str()])?;
        let dto: ChapterDto = self.get_json(url).await?;
        dto.into_chapter()
    }
}
