use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ChapterId, CourseId, QuizId, UserId};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("quiz score must be in [0, 1], got {0}")]
    InvalidQuizScore(f64),
}

/// Best or most recent result recorded for one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizScore {
    score: f64,
    passed: bool,
    recorded_at: Option<DateTime<Utc>>,
}

impl QuizScore {
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidQuizScore` if `score` is not a finite value in `[0, 1]`.
    pub fn new(
        score: f64,
        passed: bool,
        recorded_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressError> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(ProgressError::InvalidQuizScore(score));
        }
        Ok(Self {
            score,
            passed,
            recorded_at,
        })
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.recorded_at
    }
}

/// A learner's progress in one course.
///
/// `completion_percentage` is derived from the course's chapter list; it is only
/// ever set through `progress::mark_chapter_complete` or by the storage layer when
/// rehydrating a record against the chapters it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProgress {
    user_id: UserId,
    course_id: CourseId,
    completed: Vec<ChapterId>,
    quiz_scores: BTreeMap<QuizId, QuizScore>,
    last_accessed: DateTime<Utc>,
    streak_days: u32,
    completion_percentage: u8,
}

impl UserProgress {
    /// Fresh progress for a learner's first interaction with a course.
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id,
            completed: Vec::new(),
            quiz_scores: BTreeMap::new(),
            last_accessed: now,
            streak_days: 0,
            completion_percentage: 0,
        }
    }

    /// Rehydrate progress from persisted fields.
    ///
    /// Duplicate chapter ids are collapsed, keeping first-completion order.
    /// The caller supplies the percentage it computed against the course chapters.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        course_id: CourseId,
        completed: Vec<ChapterId>,
        quiz_scores: BTreeMap<QuizId, QuizScore>,
        last_accessed: DateTime<Utc>,
        streak_days: u32,
        completion_percentage: u8,
    ) -> Self {
        let mut unique: Vec<ChapterId> = Vec::with_capacity(completed.len());
        for id in completed {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self {
            user_id,
            course_id,
            completed: unique,
            quiz_scores,
            last_accessed,
            streak_days,
            completion_percentage: completion_percentage.min(100),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    /// Completed chapters in the order they were completed.
    #[must_use]
    pub fn completed_chapters(&self) -> &[ChapterId] {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, chapter_id: &ChapterId) -> bool {
        self.completed.contains(chapter_id)
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &BTreeMap<QuizId, QuizScore> {
        &self.quiz_scores
    }

    #[must_use]
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    #[must_use]
    pub fn streak_days(&self) -> u32 {
        self.streak_days
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    #[must_use]
    pub fn with_last_accessed(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed = at;
        self
    }

    /// Record the latest result for a quiz, replacing any earlier one.
    pub fn record_quiz_score(&mut self, quiz_id: QuizId, score: QuizScore) {
        self.quiz_scores.insert(quiz_id, score);
    }

    pub fn reset_streak(&mut self, at: DateTime<Utc>) {
        self.streak_days = 0;
        self.last_accessed = at;
    }

    pub(crate) fn push_completed(&mut self, chapter_id: ChapterId, percentage: u8) {
        if !self.completed.contains(&chapter_id) {
            self.completed.push(chapter_id);
        }
        self.completion_percentage = percentage.min(100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn ids() -> (UserId, CourseId) {
        (UserId::new("user-1").unwrap(), CourseId::new("c1").unwrap())
    }

    #[test]
    fn new_progress_is_empty() {
        let (user, course) = ids();
        let progress = UserProgress::new(user, course, fixed_now());
        assert!(progress.completed_chapters().is_empty());
        assert_eq!(progress.completion_percentage(), 0);
        assert_eq!(progress.streak_days(), 0);
    }

    #[test]
    fn from_persisted_collapses_duplicates() {
        let (user, course) = ids();
        let a = ChapterId::new("a").unwrap();
        let b = ChapterId::new("b").unwrap();
        let progress = UserProgress::from_persisted(
            user,
            course,
            vec![a.clone(), b.clone(), a.clone()],
            BTreeMap::new(),
            fixed_now(),
            3,
            50,
        );
        assert_eq!(progress.completed_chapters(), &[a, b]);
        assert_eq!(progress.streak_days(), 3);
    }

    #[test]
    fn quiz_score_rejects_out_of_range() {
        assert!(QuizScore::new(1.5, true, None).is_err());
        assert!(QuizScore::new(f64::NAN, false, None).is_err());
        assert!(QuizScore::new(0.0, false, None).is_ok());
    }

    #[test]
    fn record_quiz_score_replaces_previous() {
        let (user, course) = ids();
        let mut progress = UserProgress::new(user, course, fixed_now());
        let quiz = QuizId::new("quiz-1").unwrap();
        progress.record_quiz_score(quiz.clone(), QuizScore::new(0.5, false, None).unwrap());
        progress.record_quiz_score(quiz.clone(), QuizScore::new(1.0, true, None).unwrap());
        assert_eq!(progress.quiz_scores().len(), 1);
        assert!(progress.quiz_scores()[&quiz].passed());
    }
}
