#![forbid(unsafe_code)]

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use companion_core::model::{ChapterId, CourseId, QuestionId, QuizId, SearchScope, UserId};
use services::{AppServices, Clock, QuizSession};
use storage::http::HttpConfig;
use storage::seed;

mod render;
mod telemetry;

/// Learner client for the course companion backend.
#[derive(Debug, Parser)]
#[command(name = "companion", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// Backend base URL (defaults to `COMPANION_API_URL` or http://localhost:8000).
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Learner id.
    #[arg(short, long, env = "COMPANION_USER", default_value = "user-1", global = true)]
    user: UserId,
    /// Use the seeded in-memory store instead of the backend.
    #[arg(long, global = true)]
    offline: bool,
    /// Request timeout in seconds (defaults to `COMPANION_TIMEOUT_SECS` or 10).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every course.
    Courses,
    /// Show a course and its chapters.
    Course { id: CourseId },
    /// Read a chapter.
    Chapter { course: CourseId, chapter: ChapterId },
    /// Mark a chapter as completed.
    Complete { course: CourseId, chapter: ChapterId },
    /// Show progress for one course, or an overview of all courses.
    Progress { course: Option<CourseId> },
    /// Show a quiz, or take it when answers are given.
    Quiz {
        id: QuizId,
        /// `question=option`, repeatable.
        #[arg(short, long = "answer", value_parser = parse_answer)]
        answers: Vec<(QuestionId, String)>,
        /// Grade even if some questions are unanswered.
        #[arg(long)]
        partial: bool,
    },
    /// List the quizzes of a course.
    Quizzes { course: CourseId },
    /// Self-grade the built-in sample quiz without contacting the backend.
    SampleQuiz {
        #[arg(short, long = "answer", value_parser = parse_answer)]
        answers: Vec<(QuestionId, String)>,
        #[arg(long)]
        partial: bool,
    },
    /// List past attempts at a quiz.
    Attempts { quiz: QuizId },
    /// Search courses and chapters.
    Search {
        query: String,
        #[arg(long, default_value_t = SearchScope::All)]
        scope: SearchScope,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Reset the learner's streak.
    ResetStreak,
}

fn parse_answer(raw: &str) -> Result<(QuestionId, String), String> {
    let (question, option) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected question=option, got {raw:?}"))?;
    let question = QuestionId::new(question).map_err(|e| e.to_string())?;
    Ok((question, option.to_owned()))
}

fn http_config(args: &Args) -> anyhow::Result<HttpConfig> {
    let mut config = match &args.api_url {
        Some(url) => HttpConfig::new(url)?,
        None => HttpConfig::from_env()?,
    };
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn fill_session(
    session: &mut QuizSession,
    answers: &[(QuestionId, String)],
    partial: bool,
) -> anyhow::Result<()> {
    for (question, option) in answers {
        session.answer(question, option.as_str())?;
    }
    let result = if partial {
        session.submit_partial()?
    } else {
        session.submit()?
    };
    tracing::debug!(score = result.score, "graded locally");
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let clock = Clock::default_clock();
    let services = if args.offline {
        AppServices::new_offline(clock)?
    } else {
        AppServices::new_http(&http_config(&args)?, clock)?
    };
    let user = &args.user;

    let output = match &args.command {
        Command::Courses => render::courses(&services.courses().list_courses().await?),
        Command::Course { id } => {
            let course = services
                .courses()
                .course_with_chapters(id)
                .await
                .with_context(|| format!("loading course {id}"))?;
            render::course(&course)
        }
        Command::Chapter { course, chapter } => {
            render::chapter(&services.courses().chapter_view(course, chapter).await?)
        }
        Command::Complete { course, chapter } => {
            let done = services
                .progress()
                .complete_chapter(user, course, chapter)
                .await?;
            render::completion(&done)
        }
        Command::Progress { course: Some(course) } => {
            render::course_progress(&services.progress().course_progress(user, course).await?)
        }
        Command::Progress { course: None } => {
            render::overview(&services.progress().overview(user).await?)
        }
        Command::Quiz {
            id,
            answers,
            partial,
        } => {
            let quizzes = services.quizzes();
            let mut session = quizzes.start_session(id).await?;
            if answers.is_empty() && !partial {
                render::quiz(session.quiz())
            } else {
                fill_session(&mut session, answers, *partial)?;
                render::submission(&quizzes.submit(user, &session).await?)
            }
        }
        Command::Quizzes { course } => {
            render::quizzes(&services.quizzes().course_quizzes(user, course).await?)
        }
        Command::SampleQuiz { answers, partial } => {
            let mut session = QuizSession::new(seed::sample_quiz());
            session.start()?;
            if answers.is_empty() && !partial {
                render::quiz(session.quiz())
            } else {
                fill_session(&mut session, answers, *partial)?;
                let result = session
                    .result()
                    .context("graded session has a result")?;
                render::quiz_result(result)
            }
        }
        Command::Attempts { quiz } => {
            render::attempts(&services.quizzes().attempts(user, quiz).await?)
        }
        Command::Search {
            query,
            scope,
            limit,
        } => render::search_hits(&services.search().search(query, *scope, *limit).await?),
        Command::ResetStreak => {
            services.progress().reset_streak(user).await?;
            "Streak reset.\n".to_owned()
        }
    };

    print!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
