// tests/api_tests.rs

mod common;

use common::{SeededQuiz, seed_quiz, seed_student, seed_subject, seed_user, test_pool};
use schoolquiz::{
    config::Config,
    routes,
    state::AppState,
    utils::jwt::{ROLE_STUDENT, ROLE_TEACHER, sign_jwt},
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

const SECRET: &str = "test_secret_for_integration_tests";

/// Spawns the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(pool: SqlitePool) -> String {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        db_max_connections: 1,
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn bearer(user_id: i64, role: &str) -> String {
    format!("Bearer {}", sign_jwt(user_id, role, SECRET, 600).unwrap())
}

struct TestApp {
    address: String,
    client: reqwest::Client,
    auth: String,
    quiz: SeededQuiz,
}

impl TestApp {
    async fn new(question_count: usize) -> Self {
        let pool = test_pool().await;
        let student = seed_student(&pool, "ada").await;
        let subject = seed_subject(&pool, "Math").await;
        let quiz = seed_quiz(&pool, subject, "Algebra", question_count).await;
        let address = spawn_app(pool).await;

        Self {
            address,
            client: reqwest::Client::new(),
            auth: bearer(student, ROLE_STUDENT),
            quiz,
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("Authorization", &self.auth)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn submit(&self, question_id: i64, answer_id: i64) -> reqwest::Response {
        self.client
            .post(format!("{}/api/quizzes/{}/answers", self.address, self.quiz.id))
            .header("Authorization", &self.auth)
            .json(&json!({ "question_id": question_id, "answer_id": answer_id }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app(test_pool().await).await;

    let response = reqwest::get(format!("{}/random_path_that_does_not_exist", address))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn routes_require_student_token() {
    let pool = test_pool().await;
    let teacher = seed_user(&pool, "mr_t", "teacher").await;
    let address = spawn_app(pool).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/quizzes", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/quizzes", address))
        .header("Authorization", bearer(teacher, ROLE_TEACHER))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn quiz_flow_end_to_end() {
    let app = TestApp::new(2).await;
    let (q1, q2) = (app.quiz.questions[0], app.quiz.questions[1]);

    // 1. Quiz is listed as available
    let quizzes: Vec<Value> = app.get("/api/quizzes").await.json().await.unwrap();
    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0]["questions_count"], 2);

    // 2. First question, no correctness leaked
    let next: Value = app
        .get(&format!("/api/quizzes/{}/next", app.quiz.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(next["status"], "question");
    assert_eq!(next["question"]["id"], q1.id);
    assert_eq!(next["progress"], 50);
    assert!(next["question"]["answers"][0].get("is_correct").is_none());

    // 3. Answer it
    let response = app.submit(q1.id, q1.correct).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "advance");
    assert_eq!(body["remaining"], 1);
    assert_eq!(body["already_recorded"], false);

    // 4. Replay is normalized, not an error
    let body: Value = app.submit(q1.id, q1.wrong).await.json().await.unwrap();
    assert_eq!(body["status"], "advance");
    assert_eq!(body["already_recorded"], true);

    // 5. Last question completes the quiz
    let body: Value = app.submit(q2.id, q2.wrong).await.json().await.unwrap();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"]["score"], 1);
    assert_eq!(body["result"]["percentage"], 50.0);

    // 6. Next question now points at the result
    let next: Value = app
        .get(&format!("/api/quizzes/{}/next", app.quiz.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(next["status"], "completed");
    assert_eq!(next["result"]["score"], 1);

    // 7. Result review
    let result: Value = app
        .get(&format!("/api/quizzes/{}/result", app.quiz.id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(result["percentage"], 50.0);
    assert_eq!(result["questions"][0]["answers"][0]["mark"], "correct");
    assert_eq!(result["questions"][1]["answers"][1]["mark"], "wrong");

    // 8. Listings and leaderboard reflect the completion
    let quizzes: Vec<Value> = app.get("/api/quizzes").await.json().await.unwrap();
    assert!(quizzes.is_empty());

    let taken: Vec<Value> = app.get("/api/quizzes/taken").await.json().await.unwrap();
    assert_eq!(taken.len(), 1);

    let board: Vec<Value> = app.get("/api/students?q=AD").await.json().await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0]["username"], "ada");
    assert_eq!(board[0]["score"], 1);

    let me: Value = app.get("/api/students/me").await.json().await.unwrap();
    assert_eq!(me["score"], 1);
    assert_eq!(me["top_subject"]["name"], "Math");
}

#[tokio::test]
async fn submit_errors_map_to_status_codes() {
    let app = TestApp::new(2).await;
    let (q1, q2) = (app.quiz.questions[0], app.quiz.questions[1]);

    // Answer belongs to another question
    let response = app.submit(q1.id, q2.correct).await;
    assert_eq!(response.status().as_u16(), 400);

    // Unknown answer
    let response = app.submit(q1.id, 9999).await;
    assert_eq!(response.status().as_u16(), 404);

    // Invalid body
    let response = app.submit(0, q1.correct).await;
    assert_eq!(response.status().as_u16(), 400);

    // Unknown quiz
    let response = app.get("/api/quizzes/9999/next").await;
    assert_eq!(response.status().as_u16(), 404);

    // No result before completion
    let response = app
        .get(&format!("/api/quizzes/{}/result", app.quiz.id))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn empty_quiz_is_a_server_fault() {
    let app = TestApp::new(0).await;

    let response = app
        .get(&format!("/api/quizzes/{}/next", app.quiz.id))
        .await;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Internal Server Error");
}

#[tokio::test]
async fn update_courses_endpoint() {
    let app = TestApp::new(1).await;

    let response = app
        .client
        .put(format!("{}/api/students/me/courses", app.address))
        .header("Authorization", &app.auth)
        .json(&json!({ "subject_ids": [app.quiz.subject_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let courses: Vec<Value> = response.json().await.unwrap();
    assert_eq!(courses[0]["name"], "Math");

    let quizzes: Vec<Value> = app.get("/api/quizzes").await.json().await.unwrap();
    assert_eq!(quizzes[0]["in_courses"], true);

    let response = app
        .client
        .put(format!("{}/api/students/me/courses", app.address))
        .header("Authorization", &app.auth)
        .json(&json!({ "subject_ids": [4242] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
