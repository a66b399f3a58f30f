//! Completion percentages for a single course and across courses.
//!
//! All rounding is round-half-away-from-zero done in integer arithmetic, so a
//! course with 1 of 8 chapters complete reports 13%, never 12%.

use std::collections::HashSet;

use crate::model::{Chapter, ChapterId, UserProgress};

/// Completion of one course for one learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourseProgress {
    pub completed_count: usize,
    pub total_count: usize,
    pub percentage: u8,
}

impl CourseProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percentage == 100
    }
}

/// Aggregate over every course a learner is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverallStats {
    pub total_courses: usize,
    pub completed_courses: usize,
    pub average_completion: u8,
}

/// `numerator / denominator` rounded half away from zero. `denominator` must be > 0.
fn div_round(numerator: u128, denominator: u128) -> u128 {
    (2 * numerator + denominator) / (2 * denominator)
}

fn clamp_percent(value: u128) -> u8 {
    u8::try_from(value.min(100)).unwrap_or(100)
}

/// `round(100 * part / whole)`, or `0` when `whole` is zero.
#[must_use]
pub fn percent_of(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    clamp_percent(div_round(100 * part, whole as u128))
}

/// Count how many of `chapters` appear in `completed`.
///
/// Ids in `completed` that are not chapters of this course are ignored.
#[must_use]
pub fn compute_course_progress<'a, I>(chapters: &[Chapter], completed: I) -> CourseProgress
where
    I: IntoIterator<Item = &'a ChapterId>,
{
    let completed: HashSet<&ChapterId> = completed.into_iter().collect();
    let completed_count = chapters
        .iter()
        .filter(|chapter| completed.contains(chapter.id()))
        .count();
    let total_count = chapters.len();

    CourseProgress {
        completed_count,
        total_count,
        percentage: percent_of(completed_count, total_count),
    }
}

/// Summarise per-course progress.
///
/// An empty slice yields all zeros.
#[must_use]
pub fn compute_overall_stats(per_course: &[CourseProgress]) -> OverallStats {
    let total_courses = per_course.len();
    if total_courses == 0 {
        return OverallStats::default();
    }

    let completed_courses = per_course.iter().filter(|p| p.is_complete()).count();
    let sum: u128 = per_course.iter().map(|p| u128::from(p.percentage)).sum();

    OverallStats {
        total_courses,
        completed_courses,
        average_completion: clamp_percent(div_round(sum, total_courses as u128)),
    }
}

/// Add `chapter_id` to the learner's completed set and recompute the percentage.
///
/// Completing an already-completed chapter returns an equal progress value.
/// Chapters outside `chapters` are still recorded, matching the store, but do
/// not count toward the percentage.
#[must_use]
pub fn mark_chapter_complete(
    progress: &UserProgress,
    chapters: &[Chapter],
    chapter_id: &ChapterId,
) -> UserProgress {
    if progress.is_completed(chapter_id) {
        return progress.clone();
    }

    let mut next = progress.clone();
    let completed = progress
        .completed_chapters()
        .iter()
        .chain(std::iter::once(chapter_id));
    let computed = compute_course_progress(chapters, completed);
    next.push_completed(chapter_id.clone(), computed.percentage);
    next
}

/// Recompute a progress record's course completion against `chapters`.
#[must_use]
pub fn course_progress_of(progress: &UserProgress, chapters: &[Chapter]) -> CourseProgress {
    compute_course_progress(chapters, progress.completed_chapters())
}
