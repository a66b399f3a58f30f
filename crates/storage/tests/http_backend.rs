use std::collections::HashMap;

use axum::extract::{Json, Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use companion_core::model::{
    Answers, ChapterId, CourseId, QuestionId, QuizId, QuizSubmission, SearchKind, SearchScope,
    UserId,
};
use serde_json::{json, Value};
use storage::http::{HttpConfig, HttpRepository};
use storage::repository::{
    CourseRepository, ProgressRepository, QuizRepository, SearchRepository, StorageError,
};

fn chapters_json() -> Value {
    json!({
        "chapters": [
            {"id": "ch-2", "title": "Functions", "content": "def", "order": 2,
             "next_chapter_id": null, "prev_chapter_id": "ch-1"},
            {"id": "ch-1", "title": "Variables", "content": "x = 5", "order": 1,
             "next_chapter_id": "ch-2", "prev_chapter_id": null}
        ]
    })
}

fn progress_json(user: &str, course: &str, completed: &[&str]) -> Value {
    json!({
        "id": 1,
        "user_id": user,
        "course_id": course,
        "completed_chapters": completed,
        "quiz_scores": {},
        "last_accessed": "2024-05-01T10:00:00.000123",
        "streak_days": 2,
        "completion_percentage": 50.0
    })
}

async fn list_courses() -> Json<Value> {
    Json(json!({
        "courses": [
            {"id": "c1", "title": "Python", "description": "Intro", "chapters": [
                {"id": "ch-1", "title": "Variables", "order": 1}
            ]},
            {"id": "c2", "title": "Rust", "description": "Systems", "prerequisites": ["c1"]}
        ]
    }))
}

async fn get_course(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    match id.as_str() {
        "c1" => Ok(Json(json!({"id": "c1", "title": "Python", "description": "Intro"}))),
        "broken" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        "garbled" => Ok(Json(json!({"title": 42}))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn course_chapters(Path(_id): Path<String>) -> Json<Value> {
    Json(chapters_json())
}

async fn get_progress(Path((user, course)): Path<(String, String)>) -> Json<Value> {
    Json(progress_json(&user, &course, &["ch-1"]))
}

async fn mark_complete(
    Path((user, course, chapter)): Path<(String, String, String)>,
) -> Result<Json<Value>, StatusCode> {
    if chapter == "missing" {
        return Err(StatusCode::NOT_FOUND);
    }
    let mut progress = progress_json(&user, &course, &["ch-1", chapter.as_str()]);
    if let Some(obj) = progress.as_object_mut() {
        obj.remove("completion_percentage");
    }
    Ok(Json(json!({"message": "Chapter marked as completed", "progress": progress})))
}

async fn reset_streak(Path(_user): Path<String>) -> Json<Value> {
    Json(json!({"message": "Streak reset successfully"}))
}

async fn submit(Json(body): Json<Value>) -> Json<Value> {
    let answers = body["answers"].as_object().map_or(0, |a| a.len());
    let passed = answers >= 2;
    let (score, feedback) = if passed {
        (1.0, "Great job! You passed the quiz.")
    } else {
        (0.5, "Keep studying, you'll get it next time!")
    };
    Json(json!({
        "quiz_id": body["quiz_id"],
        "score": score,
        "passed": passed,
        "feedback": feedback
    }))
}

async fn attempts(Path((user, quiz)): Path<(String, String)>) -> Json<Value> {
    Json(json!([
        {"user_id": user, "quiz_id": quiz, "answers": {"q1": "x = 5"}, "score": 0.5,
         "passed": false, "completed_at": "2024-05-01T10:00:00"},
        {"user_id": user, "quiz_id": quiz, "answers": {"q1": "x = 5"}, "score": 1.0,
         "passed": true, "completed_at": "2024-05-02T10:00:00"}
    ]))
}

async fn search_all(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let query = params.get("query").cloned().unwrap_or_default();
    Json(json!({
        "query": query,
        "results": [
            {"type": "chapter", "id": "ch-1", "title": "Variables", "course_id": "c1",
             "course_title": "Python", "relevance": 0.8},
            {"type": "course", "id": "c1", "title": "Python", "description": "Intro",
             "relevance": 0.9},
            {"type": "chapter", "id": "ch-2", "title": "Functions", "course_id": "c1",
             "relevance_score": 0.6}
        ],
        "total": 3
    }))
}

async fn search_courses(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let limit = params.get("limit").cloned().unwrap_or_default();
    Json(json!({
        "results": [
            {"type": "course", "id": "c1", "title": format!("limit={limit}"), "relevance": 0.9}
        ]
    }))
}

async fn spawn_backend() -> HttpRepository {
    let app = Router::new()
        .route("/api/v1/courses/", get(list_courses))
        .route("/api/v1/courses/{id}", get(get_course))
        .route("/api/v1/courses/{id}/chapters", get(course_chapters))
        .route(
            "/api/v1/progress/{user}/courses/{course}",
            get(get_progress),
        )
        .route(
            "/api/v1/progress/{user}/courses/{course}/chapters/{chapter}",
            post(mark_complete),
        )
        .route("/api/v1/progress/{user}/streak/reset", put(reset_streak))
        .route("/api/v1/quizzes/submit", post(submit))
        .route("/api/v1/quizzes/attempts/{user}/{quiz}", get(attempts))
        .route("/api/v1/search/", get(search_all))
        .route("/api/v1/search/courses", get(search_courses));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = HttpConfig::new(&format!("http://{addr}")).unwrap();
    HttpRepository::connect(&config).unwrap()
}

fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

#[tokio::test]
async fn lists_courses_without_chapters() {
    let repo = spawn_backend().await;
    let courses = repo.list_courses().await.unwrap();
    assert_eq!(courses.len(), 2);
    assert!(courses.iter().all(|c| c.chapters().is_empty()));
    assert_eq!(courses[1].prerequisites().len(), 1);
}

#[tokio::test]
async fn chapters_come_back_in_order() {
    let repo = spawn_backend().await;
    let chapters = repo
        .list_chapters(&CourseId::new("c1").unwrap())
        .await
        .unwrap();
    let ids: Vec<&str> = chapters.iter().map(|c| c.id().as_str()).collect();
    assert_eq!(ids, ["ch-1", "ch-2"]);
    assert_eq!(chapters[0].next_id().map(ChapterId::as_str), Some("ch-2"));
}

#[tokio::test]
async fn status_codes_map_to_storage_errors() {
    let repo = spawn_backend().await;

    let missing = repo.get_course(&CourseId::new("nope").unwrap()).await;
    assert!(matches!(missing, Err(StorageError::NotFound)));

    let broken = repo.get_course(&CourseId::new("broken").unwrap()).await;
    assert!(matches!(broken, Err(StorageError::Status(500))));

    let garbled = repo.get_course(&CourseId::new("garbled").unwrap()).await;
    assert!(matches!(garbled, Err(StorageError::Serialization(_))));
}

#[tokio::test]
async fn progress_round_trip_through_backend() {
    let repo = spawn_backend().await;
    let course = CourseId::new("c1").unwrap();

    let record = repo.get_progress(&user(), &course).await.unwrap();
    assert_eq!(record.completed_chapters, vec![ChapterId::new("ch-1").unwrap()]);
    assert_eq!(record.streak_days, 2);
    assert_eq!(record.reported_percentage, Some(50.0));

    let updated = repo
        .mark_chapter_complete(&user(), &course, &ChapterId::new("ch-2").unwrap())
        .await
        .unwrap();
    assert_eq!(updated.completed_chapters.len(), 2);
    assert!(updated.reported_percentage.is_none());

    let chapters = repo.list_chapters(&course).await.unwrap();
    let progress = updated.into_progress(&chapters);
    assert_eq!(progress.completion_percentage(), 100);
}

#[tokio::test]
async fn completing_unknown_chapter_is_not_found() {
    let repo = spawn_backend().await;
    let err = repo
        .mark_chapter_complete(
            &user(),
            &CourseId::new("c1").unwrap(),
            &ChapterId::new("missing").unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn reset_streak_accepts_success() {
    let repo = spawn_backend().await;
    repo.reset_streak(&user()).await.unwrap();
}

#[tokio::test]
async fn submit_sends_answers_as_json() {
    let repo = spawn_backend().await;
    let mut answers = Answers::new();
    answers.insert(QuestionId::new("q1").unwrap(), "x = 5".into());
    answers.insert(QuestionId::new("q2").unwrap(), "def my_func():".into());
    let submission = QuizSubmission {
        user_id: user(),
        quiz_id: QuizId::new("quiz-1").unwrap(),
        answers,
    };

    let verdict = repo.submit_quiz(&submission).await.unwrap();
    assert!(verdict.passed);
    assert_eq!(verdict.quiz_id.as_str(), "quiz-1");
    assert!((verdict.score - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn attempts_are_newest_first() {
    let repo = spawn_backend().await;
    let attempts = repo
        .list_attempts(&user(), &QuizId::new("quiz-1").unwrap())
        .await
        .unwrap();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[0].passed);
    assert!(attempts[0].completed_at > attempts[1].completed_at);
}

#[tokio::test]
async fn search_orders_by_relevance_and_truncates() {
    let repo = spawn_backend().await;
    let hits = repo.search("py", SearchScope::All, 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].kind, SearchKind::Course);
    assert_eq!(hits[1].id, "ch-1");
}

#[tokio::test]
async fn scoped_search_uses_scope_endpoint() {
    let repo = spawn_backend().await;
    let hits = repo.search("py", SearchScope::Courses, 7).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "limit=7");
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = HttpConfig::new(&format!("http://{addr}")).unwrap();
    let repo = HttpRepository::connect(&config).unwrap();
    let err = repo.list_courses().await.unwrap_err();
    assert!(matches!(err, StorageError::Connection(_)));
}
