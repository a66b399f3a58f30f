//! Sample content for offline use and tests.
//!
//! The quiz mirrors the one the learner client ships for local self-scoring.

use companion_core::model::{
    Chapter, ChapterId, Course, CourseId, Question, QuestionId, Quiz, QuizId,
};

use crate::repository::{InMemoryRepository, StorageError};

pub const SAMPLE_COURSE_ID: &str = "course-python-intro";
pub const SAMPLE_QUIZ_ID: &str = "quiz-python-basics";

const SAMPLE_CHAPTERS: [(&str, &str, &str); 3] = [
    (
        "ch-python-variables",
        "Variables and Types",
        "Python binds names to values with `x = 5`. Types are checked at runtime.",
    ),
    (
        "ch-python-functions",
        "Functions",
        "Functions are declared with `def name():` and return `None` unless told otherwise.",
    ),
    (
        "ch-python-modules",
        "Modules and Imports",
        "Group related code into modules and bring it into scope with `import`.",
    ),
];

/// # Panics
///
/// Panics if the built-in id is invalid.
#[must_use]
pub fn sample_course_id() -> CourseId {
    CourseId::new(SAMPLE_COURSE_ID).expect("sample course id is valid")
}

/// Three-chapter introduction course with neighbour links filled in.
///
/// # Panics
///
/// Panics if the built-in content fails validation.
#[must_use]
pub fn sample_course() -> Course {
    let ids: Vec<ChapterId> = SAMPLE_CHAPTERS
        .iter()
        .map(|(id, _, _)| ChapterId::new(*id).expect("sample chapter id is valid"))
        .collect();

    let chapters = SAMPLE_CHAPTERS
        .iter()
        .enumerate()
        .map(|(idx, (_, title, content))| {
            let order = u32::try_from(idx + 1).expect("sample chapter count fits u32");
            let next = ids.get(idx + 1).cloned();
            let previous = idx.checked_sub(1).and_then(|p| ids.get(p)).cloned();
            Chapter::new(ids[idx].clone(), *title, *content, order)
                .expect("sample chapter is valid")
                .with_links(next, previous)
        })
        .collect();

    Course::new(
        sample_course_id(),
        "Introduction to Modern Python",
        "Learn Python from the ground up: variables, functions and modules.",
    )
    .and_then(|course| course.with_chapters(chapters))
    .expect("sample course is valid")
}

/// The locally seeded "Python Basics Quiz": two questions, 70% to pass.
///
/// # Panics
///
/// Panics if the built-in content fails validation.
#[must_use]
pub fn sample_quiz() -> Quiz {
    let q1 = Question::new(
        QuestionId::new("q1").expect("valid id"),
        "What is the correct way to declare a variable in Python?",
        ["int x = 5", "var x = 5", "x = 5", "declare x = 5"]
            .map(String::from)
            .to_vec(),
        "x = 5",
    )
    .expect("sample question is valid");
    let q2 = Question::new(
        QuestionId::new("q2").expect("valid id"),
        "Which of these is a valid Python function declaration?",
        [
            "function my_func():",
            "def my_func():",
            "func my_func():",
            "void my_func():",
        ]
        .map(String::from)
        .to_vec(),
        "def my_func():",
    )
    .expect("sample question is valid");

    Quiz::new(
        QuizId::new(SAMPLE_QUIZ_ID).expect("valid id"),
        "Python Basics Quiz",
        sample_course_id(),
        vec![q1, q2],
        0.7,
    )
    .expect("sample quiz is valid")
    .with_description("Test your knowledge of Python fundamentals")
    .with_course_title("Introduction to Modern Python")
}

impl InMemoryRepository {
    /// Seed the sample course and quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if a lock is poisoned.
    pub fn with_sample_content(self) -> Result<Self, StorageError> {
        self.upsert_course(sample_course())?;
        self.upsert_quiz(sample_quiz())?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_course_links_neighbours() {
        let course = sample_course();
        let chapters = course.chapters();
        assert_eq!(chapters.len(), 3);
        assert!(chapters[0].previous_id().is_none());
        assert_eq!(chapters[0].next_id(), Some(chapters[1].id()));
        assert_eq!(chapters[2].previous_id(), Some(chapters[1].id()));
        assert!(chapters[2].next_id().is_none());
    }

    #[test]
    fn sample_quiz_has_two_questions() {
        let quiz = sample_quiz();
        assert_eq!(quiz.questions().len(), 2);
        assert!((quiz.passing_score() - 0.7).abs() < f64::EPSILON);
    }
}
