use thiserror::Error;

use crate::model::{Answers, Quiz, QuizId, QuizResult};

/// Feedback shown when the learner reaches the passing score.
pub const PASS_FEEDBACK: &str = "Great job! You passed the quiz.";

/// Feedback shown below the passing score.
pub const RETRY_FEEDBACK: &str = "Keep studying, you'll get it next time!";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradingError {
    /// The quiz is misconfigured: there is nothing to score.
    #[error("quiz {quiz_id} has no questions")]
    NoQuestions { quiz_id: QuizId },
}

//
// ─── GRADER ────────────────────────────────────────────────────────────────────
//

/// Score `answers` against the quiz's answer key.
///
/// A question counts as correct only when an answer is present and exactly equal
/// to the correct option. Missing answers are wrong, answers to questions the
/// quiz does not have are ignored. The passing threshold is inclusive.
///
/// # Errors
///
/// Returns `GradingError::NoQuestions` if the quiz has zero questions.
#[allow(clippy::cast_precision_loss)]
pub fn grade(quiz: &Quiz, answers: &Answers) -> Result<QuizResult, GradingError> {
    let total_questions = quiz.questions().len();
    if total_questions == 0 {
        return Err(GradingError::NoQuestions {
            quiz_id: quiz.id().clone(),
        });
    }

    let correct_answers = quiz
        .questions()
        .iter()
        .filter(|question| {
            answers
                .get(question.id())
                .is_some_and(|chosen| chosen == question.correct_answer())
        })
        .count();

    let score = correct_answers as f64 / total_questions as f64;
    let passed = score >= quiz.passing_score();
    let feedback = if passed { PASS_FEEDBACK } else { RETRY_FEEDBACK };

    Ok(QuizResult {
        score,
        passed,
        feedback: feedback.to_owned(),
        correct_answers,
        total_questions,
    })
}

/// Whole-number percentage for display, rounded half away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_percent(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}
