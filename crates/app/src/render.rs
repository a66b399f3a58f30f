//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use companion_core::grading::score_percent;
use companion_core::model::{Course, Quiz, QuizAttempt, QuizResult, SearchHit, SearchKind};
use services::{
    ChapterCompletion, ChapterView, CourseProgressView, ProgressOverview, SubmissionOutcome,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn courses(courses: &[Course]) -> String {
    if courses.is_empty() {
        return "No courses available.\n".to_owned();
    }
    let mut out = String::new();
    for course in courses {
        let _ = writeln!(out, "{:<28} {}", course.id(), course.title());
    }
    out
}

pub fn course(course: &Course) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", course.title());
    if !course.description().is_empty() {
        let _ = writeln!(out, "{}", course.description());
    }
    if !course.prerequisites().is_empty() {
        let names: Vec<&str> = course.prerequisites().iter().map(|p| p.as_str()).collect();
        let _ = writeln!(out, "Prerequisites: {}", names.join(", "));
    }
    let _ = writeln!(out);
    for (idx, chapter) in course.chapters().iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {} ({})", idx + 1, chapter.title(), chapter.id());
    }
    out
}

pub fn chapter(view: &ChapterView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} - chapter {} of {}",
        view.course_title, view.position, view.total
    );
    let _ = writeln!(out, "\n{}\n", view.chapter.title());
    let _ = writeln!(out, "{}\n", view.chapter.content());
    if let Some(prev) = &view.previous {
        let _ = writeln!(out, "Previous: {} ({})", prev.title(), prev.id());
    }
    if let Some(next) = &view.next {
        let _ = writeln!(out, "Next:     {} ({})", next.title(), next.id());
    }
    out
}

fn bar(percentage: u8) -> String {
    let filled = usize::from(percentage / 5);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled))
}

pub fn course_progress(view: &CourseProgressView) -> String {
    let mut out = String::new();
    let summary = view.summary;
    let _ = writeln!(
        out,
        "{} {:>3}%  {}/{} chapters",
        bar(summary.percentage),
        summary.percentage,
        summary.completed_count,
        summary.total_count
    );
    let _ = writeln!(out, "Streak: {} days", view.progress.streak_days());
    let _ = writeln!(
        out,
        "Last accessed: {}",
        view.progress.last_accessed().format(DATE_FORMAT)
    );
    for (quiz_id, score) in view.progress.quiz_scores() {
        let _ = writeln!(
            out,
            "Quiz {quiz_id}: {}% ({})",
            score_percent(score.score()),
            if score.passed() { "passed" } else { "not passed" }
        );
    }
    out
}

pub fn completion(done: &ChapterCompletion) -> String {
    let summary = done.summary;
    let mut out = format!(
        "Chapter completed. {}/{} chapters, {}%\n",
        summary.completed_count, summary.total_count, summary.percentage
    );
    if summary.is_complete() {
        out.push_str("Course complete!\n");
    }
    out
}

pub fn overview(overview: &ProgressOverview) -> String {
    let mut out = String::new();
    for row in &overview.rows {
        let _ = writeln!(
            out,
            "{} {:>3}%  {}",
            bar(row.summary.percentage),
            row.summary.percentage,
            row.course.title()
        );
    }
    let stats = overview.stats;
    let _ = writeln!(
        out,
        "\n{} courses, {} completed, average completion {}%",
        stats.total_courses, stats.completed_courses, stats.average_completion
    );
    out
}

pub fn quiz(quiz: &Quiz) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", quiz.title(), quiz.id());
    if !quiz.description().is_empty() {
        let _ = writeln!(out, "{}", quiz.description());
    }
    let _ = writeln!(
        out,
        "Passing score: {}%",
        score_percent(quiz.passing_score())
    );
    for question in quiz.questions() {
        let _ = writeln!(out, "\n[{}] {}", question.id(), question.prompt());
        for option in question.options() {
            let _ = writeln!(out, "    - {option}");
        }
    }
    out
}

pub fn quiz_result(result: &QuizResult) -> String {
    format!(
        "Score: {}% ({}/{} correct), {}\n{}\n",
        score_percent(result.score),
        result.correct_answers,
        result.total_questions,
        if result.passed { "passed" } else { "not passed" },
        result.feedback
    )
}

pub fn submission(outcome: &SubmissionOutcome) -> String {
    let mut out = format!(
        "Score: {}%, {}\n{}\n",
        score_percent(outcome.verdict.score),
        if outcome.verdict.passed { "passed" } else { "not passed" },
        outcome.verdict.feedback
    );
    if !outcome.agrees() {
        let _ = writeln!(
            out,
            "(local preview scored {}%)",
            score_percent(outcome.local.score)
        );
    }
    out
}

pub fn quizzes(quizzes: &[Quiz]) -> String {
    if quizzes.is_empty() {
        return "No quizzes for this course.\n".to_owned();
    }
    let mut out = String::new();
    for quiz in quizzes {
        let _ = writeln!(
            out,
            "{:<28} {} ({} questions)",
            quiz.id(),
            quiz.title(),
            quiz.questions().len()
        );
    }
    out
}

pub fn attempts(attempts: &[QuizAttempt]) -> String {
    if attempts.is_empty() {
        return "No attempts yet.\n".to_owned();
    }
    let mut out = String::new();
    for attempt in attempts {
        let _ = writeln!(
            out,
            "{}  {:>3}%  {}",
            attempt.completed_at.format(DATE_FORMAT),
            score_percent(attempt.score),
            if attempt.passed { "passed" } else { "not passed" }
        );
    }
    out
}

pub fn search_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results.\n".to_owned();
    }
    let mut out = String::new();
    for hit in hits {
        let kind = match hit.kind {
            SearchKind::Course => "course",
            SearchKind::Chapter => "chapter",
        };
        let _ = write!(out, "{kind:<8} {} ({})", hit.title, hit.id);
        if let Some(course) = hit.course_title.as_deref().or(hit.course_id.as_deref()) {
            let _ = write!(out, " in {course}");
        }
        let _ = writeln!(out);
    }
    out
}
