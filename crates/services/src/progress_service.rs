use std::sync::Arc;

use futures::future::join_all;

use companion_core::model::{Chapter, ChapterId, Course, CourseId, UserId, UserProgress};
use companion_core::progress::{self, CourseProgress, OverallStats};
use storage::repository::{CourseRepository, ProgressRepository, StorageError};

use crate::Clock;
use crate::error::ProgressServiceError;

/// A learner's progress in one course plus the locally computed completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseProgressView {
    pub progress: UserProgress,
    pub summary: CourseProgress,
}

/// Result of marking a chapter complete.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterCompletion {
    /// Progress as confirmed by the store.
    pub progress: UserProgress,
    pub summary: CourseProgress,
    /// True when the store's answer differed from the optimistic local update.
    pub reconciled: bool,
}

/// One row of the progress overview.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseOverviewRow {
    pub course: Course,
    pub summary: CourseProgress,
    pub streak_days: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressOverview {
    pub rows: Vec<CourseOverviewRow>,
    pub stats: OverallStats,
}

/// Orchestrates progress reads and chapter completion against the store.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            progress,
        }
    }

    async fn load(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<(Vec<Chapter>, UserProgress), StorageError> {
        let (chapters, record) = futures::try_join!(
            self.courses.list_chapters(course_id),
            self.progress.get_progress(user_id, course_id),
        )?;
        let progress = record.into_progress(&chapters);
        Ok((chapters, progress))
    }

    /// Fetch progress for one course and compute its completion.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if chapters or progress cannot be read.
    pub async fn course_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<CourseProgressView, ProgressServiceError> {
        let (chapters, progress) = self.load(user_id, course_id).await?;
        let summary = progress::course_progress_of(&progress, &chapters);
        Ok(CourseProgressView { progress, summary })
    }

    /// Mark a chapter complete: update locally, persist, then adopt the store's view.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store rejects the update.
    pub async fn complete_chapter(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<ChapterCompletion, ProgressServiceError> {
        let (chapters, current) = self.load(user_id, course_id).await?;
        let optimistic = if current.is_completed(chapter_id) {
            current
        } else {
            progress::mark_chapter_complete(&current, &chapters, chapter_id)
                .with_last_accessed(self.clock.now())
        };

        let record = self
            .progress
            .mark_chapter_complete(user_id, course_id, chapter_id)
            .await?;
        let confirmed = record.into_progress(&chapters);

        let reconciled = confirmed.completed_chapters() != optimistic.completed_chapters()
            || confirmed.completion_percentage() != optimistic.completion_percentage();
        if reconciled {
            tracing::warn!(
                user = %user_id,
                course = %course_id,
                chapter = %chapter_id,
                local = optimistic.completion_percentage(),
                store = confirmed.completion_percentage(),
                "store progress differs from local update, keeping store"
            );
        }
        tracing::info!(
            user = %user_id,
            course = %course_id,
            chapter = %chapter_id,
            percentage = confirmed.completion_percentage(),
            "chapter completed"
        );

        let summary = progress::course_progress_of(&confirmed, &chapters);
        Ok(ChapterCompletion {
            progress: confirmed,
            summary,
            reconciled,
        })
    }

    /// Progress across every course in the catalogue.
    ///
    /// Courses are fetched concurrently; rows keep catalogue order. A course
    /// whose chapters or progress cannot be read shows as 0% and still counts
    /// toward the totals.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the catalogue cannot be listed.
    pub async fn overview(&self, user_id: &UserId) -> Result<ProgressOverview, ProgressServiceError> {
        let courses = self.courses.list_courses().await?;
        let rows = join_all(courses.into_iter().map(|course| async move {
            match self.load(user_id, course.id()).await {
                Ok((chapters, progress)) => CourseOverviewRow {
                    summary: progress::course_progress_of(&progress, &chapters),
                    streak_days: progress.streak_days(),
                    course,
                },
                Err(e) => {
                    tracing::warn!(
                        user = %user_id,
                        course = %course.id(),
                        error = %e,
                        "course progress unavailable, showing 0%"
                    );
                    CourseOverviewRow {
                        summary: CourseProgress::default(),
                        streak_days: 0,
                        course,
                    }
                }
            }
        }))
        .await;

        let summaries: Vec<CourseProgress> = rows.iter().map(|row| row.summary).collect();
        let stats = progress::compute_overall_stats(&summaries);
        Ok(ProgressOverview { rows, stats })
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the store rejects the reset.
    pub async fn reset_streak(&self, user_id: &UserId) -> Result<(), ProgressServiceError> {
        self.progress.reset_streak(user_id).await?;
        tracing::info!(user = %user_id, "streak reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;
    use storage::seed;

    fn service() -> ProgressService {
        let repo = InMemoryRepository::new()
            .with_clock(fixed_clock())
            .with_sample_content()
            .unwrap();
        ProgressService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo))
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn fresh_learner_has_zero_progress() {
        let svc = service();
        let view = svc
            .course_progress(&user(), &seed::sample_course_id())
            .await
            .unwrap();
        assert_eq!(view.summary.completed_count, 0);
        assert_eq!(view.summary.total_count, 3);
        assert_eq!(view.progress.completion_percentage(), 0);
    }

    #[tokio::test]
    async fn completing_chapters_accumulates() {
        let svc = service();
        let course = seed::sample_course_id();
        let first = svc
            .complete_chapter(&user(), &course, &ChapterId::new("ch-python-variables").unwrap())
            .await
            .unwrap();
        assert!(!first.reconciled);
        assert_eq!(first.summary.percentage, 33);

        let second = svc
            .complete_chapter(&user(), &course, &ChapterId::new("ch-python-functions").unwrap())
            .await
            .unwrap();
        assert_eq!(second.summary.percentage, 67);
        assert_eq!(second.progress.completed_chapters().len(), 2);
    }

    #[tokio::test]
    async fn completing_twice_is_idempotent() {
        let svc = service();
        let course = seed::sample_course_id();
        let chapter = ChapterId::new("ch-python-modules").unwrap();
        let first = svc.complete_chapter(&user(), &course, &chapter).await.unwrap();
        let second = svc.complete_chapter(&user(), &course, &chapter).await.unwrap();
        assert_eq!(first.progress, second.progress);
        assert!(!second.reconciled);
    }

    #[tokio::test]
    async fn overview_aggregates_courses() {
        let svc = service();
        let overview = svc.overview(&user()).await.unwrap();
        assert_eq!(overview.rows.len(), 1);
        assert_eq!(overview.stats.total_courses, 1);
        assert_eq!(overview.stats.completed_courses, 0);
        assert_eq!(overview.stats.average_completion, 0);
    }
}
