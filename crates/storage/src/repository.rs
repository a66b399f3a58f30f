use async_trait::async_trait;
use chrono::{DateTime, Utc};
use companion_core::Clock;
use companion_core::grading::{self, GradingError};
use companion_core::model::{
    Chapter, ChapterId, Course, CourseId, Quiz, QuizAttempt, QuizId, QuizScore, QuizSubmission,
    SearchHit, SearchKind, SearchScope, UserId, UserProgress,
};
use companion_core::progress;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("backend returned status {0}")]
    Status(u16),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<GradingError> for StorageError {
    fn from(err: GradingError) -> Self {
        StorageError::Rejected(err.to_string())
    }
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Persisted shape of a learner's progress in one course.
///
/// The store does not know which chapter list the client is rendering, so the
/// record carries raw fields and the percentage it reported (if any). Call
/// `into_progress` with the course chapters to get a `UserProgress` whose
/// percentage satisfies the completion invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub completed_chapters: Vec<ChapterId>,
    pub quiz_scores: BTreeMap<QuizId, QuizScore>,
    pub last_accessed: DateTime<Utc>,
    pub streak_days: u32,
    pub reported_percentage: Option<f64>,
}

impl ProgressRecord {
    /// Default record for a learner who has not touched the course yet.
    #[must_use]
    pub fn empty(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id,
            completed_chapters: Vec::new(),
            quiz_scores: BTreeMap::new(),
            last_accessed: now,
            streak_days: 0,
            reported_percentage: None,
        }
    }

    #[must_use]
    pub fn from_progress(progress: &UserProgress) -> Self {
        Self {
            user_id: progress.user_id().clone(),
            course_id: progress.course_id().clone(),
            completed_chapters: progress.completed_chapters().to_vec(),
            quiz_scores: progress.quiz_scores().clone(),
            last_accessed: progress.last_accessed(),
            streak_days: progress.streak_days(),
            reported_percentage: Some(f64::from(progress.completion_percentage())),
        }
    }

    /// Convert the record into a domain `UserProgress` for the given chapter list.
    #[must_use]
    pub fn into_progress(self, chapters: &[Chapter]) -> UserProgress {
        let computed = progress::compute_course_progress(chapters, &self.completed_chapters);
        UserProgress::from_persisted(
            self.user_id,
            self.course_id,
            self.completed_chapters,
            self.quiz_scores,
            self.last_accessed,
            self.streak_days,
            computed.percentage,
        )
    }
}

/// The store's verdict on a submitted quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedQuiz {
    pub quiz_id: QuizId,
    pub score: f64,
    pub passed: bool,
    pub feedback: String,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read access to the course catalogue.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// List every course, without chapters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalogue cannot be read.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Fetch a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError>;

    /// Fetch the ordered chapters of a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course is missing.
    async fn list_chapters(&self, course_id: &CourseId) -> Result<Vec<Chapter>, StorageError>;

    /// Fetch a single chapter by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_chapter(&self, id: &ChapterId) -> Result<Chapter, StorageError>;
}

/// Learner progress, owned by the store.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch progress, or an empty record when the learner has none yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course is missing.
    async fn get_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<ProgressRecord, StorageError>;

    /// Record a completed chapter. Completing a chapter twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course or chapter is missing.
    async fn mark_chapter_complete(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<ProgressRecord, StorageError>;

    /// Reset the learner's streak across all courses.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store rejects the update.
    async fn reset_streak(&self, user_id: &UserId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is missing.
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the quizzes cannot be listed.
    async fn list_course_quizzes(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Quiz>, StorageError>;

    /// Submit answers for authoritative grading and persistence.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is missing.
    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<SubmittedQuiz, StorageError>;

    /// Past attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if attempts cannot be read.
    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError>;
}

#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Ranked hits for `query`, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the search backend fails.
    async fn search(
        &self,
        query: &str,
        scope: SearchScope,
        limit: u32,
    ) -> Result<Vec<SearchHit>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

const COURSE_RELEVANCE: f64 = 0.9;
const CHAPTER_TITLE_RELEVANCE: f64 = 0.8;
const CHAPTER_CONTENT_RELEVANCE: f64 = 0.6;

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn hit_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Simple in-memory repository implementation for testing and offline use.
///
/// Mirrors the store's behavior closely enough for the services layer: progress
/// is created lazily, submissions are graded and recorded, and search matches
/// case-insensitive substrings with fixed relevance tiers.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    courses: Arc<Mutex<Vec<Course>>>,
    progress: Arc<Mutex<HashMap<(UserId, CourseId), ProgressRecord>>>,
    quizzes: Arc<Mutex<Vec<Quiz>>>,
    attempts: Arc<Mutex<Vec<QuizAttempt>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Insert or replace a course (matched by ID), keeping catalogue order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_course(&self, course: Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(lock_err)?;
        match guard.iter_mut().find(|c| c.id() == course.id()) {
            Some(existing) => *existing = course,
            None => guard.push(course),
        }
        Ok(())
    }

    /// Insert or replace a quiz (matched by ID).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_quiz(&self, quiz: Quiz) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(lock_err)?;
        match guard.iter_mut().find(|q| q.id() == quiz.id()) {
            Some(existing) => *existing = quiz,
            None => guard.push(quiz),
        }
        Ok(())
    }

    fn course(&self, id: &CourseId) -> Result<Course, StorageError> {
        let guard = self.courses.lock().map_err(lock_err)?;
        guard
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let guard = self.quizzes.lock().map_err(lock_err)?;
        guard
            .iter()
            .find(|q| q.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(lock_err)?;
        Ok(guard.iter().map(Course::without_chapters).collect())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError> {
        self.course(id)
    }

    async fn list_chapters(&self, course_id: &CourseId) -> Result<Vec<Chapter>, StorageError> {
        Ok(self.course(course_id)?.chapters().to_vec())
    }

    async fn get_chapter(&self, id: &ChapterId) -> Result<Chapter, StorageError> {
        let guard = self.courses.lock().map_err(lock_err)?;
        guard
            .iter()
            .find_map(|c| c.chapter(id))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<ProgressRecord, StorageError> {
        let course = self.course(course_id)?;
        let guard = self.progress.lock().map_err(lock_err)?;
        let record = guard
            .get(&(user_id.clone(), course_id.clone()))
            .cloned()
            .unwrap_or_else(|| {
                ProgressRecord::empty(user_id.clone(), course_id.clone(), self.clock.now())
            });
        let percentage =
            progress::compute_course_progress(course.chapters(), &record.completed_chapters)
                .percentage;
        Ok(ProgressRecord {
            reported_percentage: Some(f64::from(percentage)),
            ..record
        })
    }

    async fn mark_chapter_complete(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<ProgressRecord, StorageError> {
        let course = self.course(course_id)?;
        if course.chapter(chapter_id).is_none() {
            return Err(StorageError::NotFound);
        }

        let now = self.clock.now();
        let mut guard = self.progress.lock().map_err(lock_err)?;
        let key = (user_id.clone(), course_id.clone());
        let current = guard
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ProgressRecord::empty(user_id.clone(), course_id.clone(), now))
            .into_progress(course.chapters());

        let updated = if current.is_completed(chapter_id) {
            current
        } else {
            progress::mark_chapter_complete(&current, course.chapters(), chapter_id)
                .with_last_accessed(now)
        };

        let record = ProgressRecord::from_progress(&updated);
        guard.insert(key, record.clone());
        Ok(record)
    }

    async fn reset_streak(&self, user_id: &UserId) -> Result<(), StorageError> {
        let now = self.clock.now();
        let mut guard = self.progress.lock().map_err(lock_err)?;
        for ((owner, _), record) in guard.iter_mut() {
            if owner == user_id {
                record.streak_days = 0;
                record.last_accessed = now;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        self.quiz(id)
    }

    async fn list_course_quizzes(
        &self,
        _user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(lock_err)?;
        Ok(guard
            .iter()
            .filter(|q| q.course_id() == course_id)
            .cloned()
            .collect())
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<SubmittedQuiz, StorageError> {
        let quiz = self.quiz(&submission.quiz_id)?;
        let result = grading::grade(&quiz, &submission.answers)?;
        let now = self.clock.now();

        self.attempts.lock().map_err(lock_err)?.push(QuizAttempt {
            user_id: submission.user_id.clone(),
            quiz_id: submission.quiz_id.clone(),
            answers: submission.answers.clone(),
            score: result.score,
            passed: result.passed,
            completed_at: now,
        });

        let score = QuizScore::new(result.score, result.passed, Some(now)).map_err(hit_err)?;
        let mut guard = self.progress.lock().map_err(lock_err)?;
        guard
            .entry((submission.user_id.clone(), quiz.course_id().clone()))
            .or_insert_with(|| {
                ProgressRecord::empty(submission.user_id.clone(), quiz.course_id().clone(), now)
            })
            .quiz_scores
            .insert(submission.quiz_id.clone(), score);

        Ok(SubmittedQuiz {
            quiz_id: submission.quiz_id.clone(),
            score: result.score,
            passed: result.passed,
            feedback: result.feedback,
        })
    }

    async fn list_attempts(
        &self,
        user_id: &UserId,
        quiz_id: &QuizId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let guard = self.attempts.lock().map_err(lock_err)?;
        let mut attempts: Vec<QuizAttempt> = guard
            .iter()
            .filter(|a| &a.user_id == user_id && &a.quiz_id == quiz_id)
            .cloned()
            .collect();
        attempts.reverse();
        attempts.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(attempts)
    }
}

#[async_trait]
impl SearchRepository for InMemoryRepository {
    async fn search(
        &self,
        query: &str,
        scope: SearchScope,
        limit: u32,
    ) -> Result<Vec<SearchHit>, StorageError> {
        let needle = query.to_lowercase();
        let matches = |text: &str| text.to_lowercase().contains(&needle);
        let guard = self.courses.lock().map_err(lock_err)?;
        let mut hits = Vec::new();

        if scope.includes(SearchKind::Course) {
            for course in guard.iter() {
                if matches(course.title()) || matches(course.description()) {
                    hits.push(
                        SearchHit::new(
                            SearchKind::Course,
                            course.id().as_str(),
                            course.title(),
                            COURSE_RELEVANCE,
                        )
                        .map_err(hit_err)?
                        .with_description(course.description()),
                    );
                }
            }
        }

        if scope.includes(SearchKind::Chapter) {
            for course in guard.iter() {
                for chapter in course.chapters() {
                    let relevance = if matches(chapter.title()) {
                        CHAPTER_TITLE_RELEVANCE
                    } else if matches(chapter.content()) {
                        CHAPTER_CONTENT_RELEVANCE
                    } else {
                        continue;
                    };
                    hits.push(
                        SearchHit::new(
                            SearchKind::Chapter,
                            chapter.id().as_str(),
                            chapter.title(),
                            relevance,
                        )
                        .map_err(hit_err)?
                        .with_course(course.id().as_str(), Some(course.title().to_owned())),
                    );
                }
            }
        }

        hits.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
        hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(hits)
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub search: Arc<dyn SearchRepository>,
}

impl Storage {
    /// Share one repository value across all four contracts.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: CourseRepository
            + ProgressRepository
            + QuizRepository
            + SearchRepository
            + Clone
            + 'static,
    {
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let search: Arc<dyn SearchRepository> = Arc::new(repo);
        Self {
            courses,
            progress,
            quizzes,
            search,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::model::{Answers, QuestionId};
    use companion_core::time::{fixed_clock, fixed_now};

    use crate::seed;

    fn seeded() -> InMemoryRepository {
        InMemoryRepository::new()
            .with_clock(fixed_clock())
            .with_sample_content()
            .unwrap()
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn list_courses_strips_chapters() {
        let repo = seeded();
        let courses = repo.list_courses().await.unwrap();
        assert_eq!(courses.len(), 1);
        assert!(courses[0].chapters().is_empty());

        let full = repo.get_course(courses[0].id()).await.unwrap();
        assert_eq!(full.chapters().len(), 3);
    }

    #[tokio::test]
    async fn progress_defaults_to_empty_record() {
        let repo = seeded();
        let record = repo
            .get_progress(&user(), &seed::sample_course_id())
            .await
            .unwrap();
        assert!(record.completed_chapters.is_empty());
        assert_eq!(record.last_accessed, fixed_now());
    }

    #[tokio::test]
    async fn progress_for_unknown_course_is_not_found() {
        let repo = seeded();
        let err = repo
            .get_progress(&user(), &CourseId::new("nope").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn marking_complete_twice_is_a_noop() {
        let repo = seeded();
        let course = seed::sample_course_id();
        let chapter = ChapterId::new("ch-python-variables").unwrap();

        let first = repo
            .mark_chapter_complete(&user(), &course, &chapter)
            .await
            .unwrap();
        let second = repo
            .mark_chapter_complete(&user(), &course, &chapter)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.completed_chapters, vec![chapter]);
        assert_eq!(second.reported_percentage, Some(33.0));
    }

    #[tokio::test]
    async fn marking_unknown_chapter_is_not_found() {
        let repo = seeded();
        let err = repo
            .mark_chapter_complete(
                &user(),
                &seed::sample_course_id(),
                &ChapterId::new("missing").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn submit_records_attempt_and_score() {
        let repo = seeded();
        let quiz = seed::sample_quiz();
        let mut answers = Answers::new();
        answers.insert(QuestionId::new("q1").unwrap(), "x = 5".into());
        answers.insert(QuestionId::new("q2").unwrap(), "def my_func():".into());
        let submission = QuizSubmission {
            user_id: user(),
            quiz_id: quiz.id().clone(),
            answers,
        };

        let verdict = repo.submit_quiz(&submission).await.unwrap();
        assert!(verdict.passed);

        let attempts = repo.list_attempts(&user(), quiz.id()).await.unwrap();
        assert_eq!(attempts.len(), 1);

        let record = repo.get_progress(&user(), quiz.course_id()).await.unwrap();
        assert!(record.quiz_scores[quiz.id()].passed());
    }

    #[tokio::test]
    async fn search_ranks_courses_above_chapters() {
        let repo = seeded();
        let hits = repo.search("python", SearchScope::All, 10).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].kind, SearchKind::Course);
        assert!(
            hits.windows(2)
                .all(|pair| pair[0].relevance() >= pair[1].relevance())
        );
    }

    #[tokio::test]
    async fn search_respects_scope_and_limit() {
        let repo = seeded();
        let hits = repo
            .search("python", SearchScope::Chapters, 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, SearchKind::Chapter);
    }

    #[tokio::test]
    async fn reset_streak_only_touches_owner() {
        let repo = seeded();
        let course = seed::sample_course_id();
        let other = UserId::new("user-2").unwrap();
        {
            let mut guard = repo.progress.lock().unwrap();
            for owner in [user(), other.clone()] {
                let mut record = ProgressRecord::empty(owner.clone(), course.clone(), fixed_now());
                record.streak_days = 4;
                guard.insert((owner, course.clone()), record);
            }
        }

        repo.reset_streak(&user()).await.unwrap();

        let record = repo.get_progress(&user(), &course).await.unwrap();
        assert_eq!(record.streak_days, 0);
        let untouched = repo.get_progress(&other, &course).await.unwrap();
        assert_eq!(untouched.streak_days, 4);
    }
}
