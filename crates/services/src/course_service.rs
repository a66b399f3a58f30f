use std::sync::Arc;

use companion_core::model::{Chapter, ChapterId, Course, CourseId};
use storage::repository::CourseRepository;

use crate::error::CourseServiceError;

/// A chapter together with where it sits in its course.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterView {
    pub course_id: CourseId,
    pub course_title: String,
    pub chapter: Chapter,
    /// 1-based position within the course.
    pub position: usize,
    pub total: usize,
    pub previous: Option<Chapter>,
    pub next: Option<Chapter>,
}

/// Read-side orchestration over the course catalogue.
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// List the catalogue. Courses come back without chapters.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseServiceError> {
        let courses = self.courses.list_courses().await?;
        Ok(courses)
    }

    /// Fetch a course and make sure its chapter list is populated.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the course or its chapters cannot be read.
    /// Returns `CourseServiceError::Course` if the chapter list is inconsistent.
    pub async fn course_with_chapters(&self, id: &CourseId) -> Result<Course, CourseServiceError> {
        let course = self.courses.get_course(id).await?;
        if !course.chapters().is_empty() {
            return Ok(course);
        }
        let chapters = self.courses.list_chapters(id).await?;
        Ok(course.with_chapters(chapters)?)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if the chapter cannot be read.
    pub async fn chapter(&self, id: &ChapterId) -> Result<Chapter, CourseServiceError> {
        let chapter = self.courses.get_chapter(id).await?;
        Ok(chapter)
    }

    /// Load `chapter_id` with its neighbours inside `course_id`.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::ChapterNotInCourse` if the chapter belongs elsewhere.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn chapter_view(
        &self,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<ChapterView, CourseServiceError> {
        let course = self.course_with_chapters(course_id).await?;
        let position = course
            .chapters()
            .iter()
            .position(|c| c.id() == chapter_id)
            .ok_or_else(|| CourseServiceError::ChapterNotInCourse {
                course: course_id.clone(),
                chapter: chapter_id.clone(),
            })?;

        Ok(ChapterView {
            course_id: course.id().clone(),
            course_title: course.title().to_owned(),
            chapter: course.chapters()[position].clone(),
            position: position + 1,
            total: course.chapters().len(),
            previous: course.previous_chapter(chapter_id).cloned(),
            next: course.next_chapter(chapter_id).cloned(),
        })
    }

    /// Chapter after `chapter_id`, or `None` at the end of the course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::ChapterNotInCourse` if the chapter belongs elsewhere.
    pub async fn next_chapter(
        &self,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<Option<Chapter>, CourseServiceError> {
        Ok(self.chapter_view(course_id, chapter_id).await?.next)
    }

    /// Chapter before `chapter_id`, or `None` at the start of the course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::ChapterNotInCourse` if the chapter belongs elsewhere.
    pub async fn previous_chapter(
        &self,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<Option<Chapter>, CourseServiceError> {
        Ok(self.chapter_view(course_id, chapter_id).await?.previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, StorageError};
    use storage::seed;

    fn service() -> CourseService {
        let repo = InMemoryRepository::new().with_sample_content().unwrap();
        CourseService::new(Arc::new(repo))
    }

    fn chapter_id(id: &str) -> ChapterId {
        ChapterId::new(id).unwrap()
    }

    #[tokio::test]
    async fn course_with_chapters_fills_chapter_list() {
        let svc = service();
        let listed = svc.list_courses().await.unwrap();
        assert!(listed[0].chapters().is_empty());

        let course = svc.course_with_chapters(listed[0].id()).await.unwrap();
        assert_eq!(course.chapters().len(), 3);
    }

    #[tokio::test]
    async fn chapter_view_reports_neighbours() {
        let svc = service();
        let view = svc
            .chapter_view(&seed::sample_course_id(), &chapter_id("ch-python-functions"))
            .await
            .unwrap();
        assert_eq!(view.position, 2);
        assert_eq!(view.total, 3);
        assert_eq!(
            view.previous.as_ref().map(|c| c.id().as_str()),
            Some("ch-python-variables")
        );
        assert_eq!(
            view.next.as_ref().map(|c| c.id().as_str()),
            Some("ch-python-modules")
        );
    }

    #[tokio::test]
    async fn boundaries_have_no_neighbour() {
        let svc = service();
        let course = seed::sample_course_id();
        let first = svc
            .previous_chapter(&course, &chapter_id("ch-python-variables"))
            .await
            .unwrap();
        assert!(first.is_none());
        let last = svc
            .next_chapter(&course, &chapter_id("ch-python-modules"))
            .await
            .unwrap();
        assert!(last.is_none());
    }

    #[tokio::test]
    async fn foreign_chapter_is_rejected() {
        let svc = service();
        let err = svc
            .chapter_view(&seed::sample_course_id(), &chapter_id("elsewhere"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::ChapterNotInCourse { .. }));
    }

    #[tokio::test]
    async fn missing_course_surfaces_not_found() {
        let svc = service();
        let err = svc
            .course_with_chapters(&CourseId::new("nope").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseServiceError::Storage(StorageError::NotFound)
        ));
    }
}
