use companion_core::grading;
use companion_core::model::{Answers, QuestionId, Quiz, QuizResult};

use crate::error::QuizSessionError;

/// Where a quiz session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizSessionState {
    NotStarted,
    InProgress,
    Submitted,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Caller-owned state for one learner taking one quiz.
///
/// The session holds the answers chosen so far and, once submitted, the graded
/// result. It keeps no attempt history; retaking starts from a blank answer sheet.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    state: QuizSessionState,
    answers: Answers,
    result: Option<QuizResult>,
}

impl QuizSession {
    #[must_use]
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            state: QuizSessionState::NotStarted,
            answers: Answers::new(),
            result: None,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn state(&self) -> QuizSessionState {
        self.state
    }

    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.quiz
            .questions()
            .iter()
            .filter(|q| self.answers.contains_key(q.id()))
            .count()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.quiz.questions().len()
    }

    /// # Errors
    ///
    /// Returns `QuizSessionError::AlreadyStarted` unless the session is fresh.
    pub fn start(&mut self) -> Result<(), QuizSessionError> {
        if self.state != QuizSessionState::NotStarted {
            return Err(QuizSessionError::AlreadyStarted);
        }
        self.answers.clear();
        self.state = QuizSessionState::InProgress;
        Ok(())
    }

    /// Choose `option` for `question`, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::NotInProgress` outside `InProgress`.
    /// Returns `QuizSessionError::UnknownQuestion` or `InvalidOption` when the
    /// choice does not exist on this quiz.
    pub fn answer(
        &mut self,
        question: &QuestionId,
        option: impl Into<String>,
    ) -> Result<(), QuizSessionError> {
        if self.state != QuizSessionState::InProgress {
            return Err(QuizSessionError::NotInProgress);
        }
        let option = option.into();
        let Some(q) = self.quiz.question(question) else {
            return Err(QuizSessionError::UnknownQuestion(question.clone()));
        };
        if !q.has_option(&option) {
            return Err(QuizSessionError::InvalidOption {
                question: question.clone(),
                option,
            });
        }
        self.answers.insert(question.clone(), option);
        Ok(())
    }

    /// True when the session is in progress and every question has an answer.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.state == QuizSessionState::InProgress
            && self.answered_count() == self.question_count()
    }

    /// Grade a fully answered sheet.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Incomplete` if any question is unanswered,
    /// `NotInProgress` outside `InProgress`, or `Grading` for a quiz with no questions.
    pub fn submit(&mut self) -> Result<&QuizResult, QuizSessionError> {
        if self.state != QuizSessionState::InProgress {
            return Err(QuizSessionError::NotInProgress);
        }
        if !self.can_submit() {
            return Err(QuizSessionError::Incomplete {
                answered: self.answered_count(),
                total: self.question_count(),
            });
        }
        self.finish()
    }

    /// Grade whatever has been answered; unanswered questions count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::NotInProgress` outside `InProgress`, or
    /// `Grading` for a quiz with no questions.
    pub fn submit_partial(&mut self) -> Result<&QuizResult, QuizSessionError> {
        if self.state != QuizSessionState::InProgress {
            return Err(QuizSessionError::NotInProgress);
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<&QuizResult, QuizSessionError> {
        let result = grading::grade(&self.quiz, &self.answers)?;
        self.state = QuizSessionState::Submitted;
        Ok(&*self.result.insert(result))
    }

    /// Throw away answers and result and go back to answering.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::NotSubmitted` unless the session was submitted.
    pub fn retake(&mut self) -> Result<(), QuizSessionError> {
        if self.state != QuizSessionState::Submitted {
            return Err(QuizSessionError::NotSubmitted);
        }
        self.answers.clear();
        self.result = None;
        self.state = QuizSessionState::InProgress;
        Ok(())
    }
}
