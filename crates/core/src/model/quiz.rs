use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, QuestionId, QuizId, UserId};

/// Passing threshold used when the store does not send one.
pub const DEFAULT_PASSING_SCORE: f64 = 0.7;

/// Learner answers keyed by question, holding the chosen option text.
pub type Answers = BTreeMap<QuestionId, String>;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {0} lists the same option twice")]
    DuplicateOption(QuestionId),

    #[error("correct answer for question {0} is not one of its options")]
    CorrectAnswerNotAnOption(QuestionId),

    #[error("question {0} appears more than once in the quiz")]
    DuplicateQuestion(QuestionId),

    #[error("passing score must be in [0, 1], got {0}")]
    InvalidPassingScore(f64),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuizError` if there are no options, an option repeats, or the
    /// correct answer is not among the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuizError> {
        if options.is_empty() {
            return Err(QuizError::NoOptions(id));
        }
        let mut seen = HashSet::with_capacity(options.len());
        if !options.iter().all(|o| seen.insert(o.as_str())) {
            return Err(QuizError::DuplicateOption(id));
        }
        let correct_answer = correct_answer.into();
        if !options.contains(&correct_answer) {
            return Err(QuizError::CorrectAnswerNotAnOption(id));
        }
        Ok(Self {
            id,
            prompt: prompt.into(),
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Exact match against the presented options.
    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// An ordered set of questions plus the threshold needed to pass.
///
/// A quiz with zero questions can be built (the store may send one) but
/// `grading::grade` refuses it.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    course_id: CourseId,
    course_title: Option<String>,
    questions: Vec<Question>,
    passing_score: f64,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError` for a blank title, repeated question ids, or a passing
    /// score outside `[0, 1]`.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        course_id: CourseId,
        questions: Vec<Question>,
        passing_score: f64,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if !passing_score.is_finite() || !(0.0..=1.0).contains(&passing_score) {
            return Err(QuizError::InvalidPassingScore(passing_score));
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion(question.id().clone()));
            }
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: String::new(),
            course_id,
            course_title: None,
            questions,
            passing_score,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_course_title(mut self, course_title: impl Into<String>) -> Self {
        self.course_title = Some(course_title.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn course_title(&self) -> Option<&str> {
        self.course_title.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn passing_score(&self) -> f64 {
        self.passing_score
    }
}

//
// ─── SUBMISSIONS & RESULTS ─────────────────────────────────────────────────────
//

/// Answers sent for grading. Built once and consumed by a single submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub answers: Answers,
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub score: f64,
    pub passed: bool,
    pub feedback: String,
    pub correct_answers: usize,
    pub total_questions: usize,
}

/// A past submission as reported by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub answers: Answers,
    pub score: f64,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}
