// tests/common/mod.rs

#![allow(dead_code)]

use std::str::FromStr;

use schoolquiz::{
    config::Config,
    db::{self, MIGRATOR},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// A seeded question: one correct and one wrong option.
#[derive(Debug, Clone, Copy)]
pub struct SeededQuestion {
    pub id: i64,
    pub correct: i64,
    pub wrong: i64,
}

#[derive(Debug, Clone)]
pub struct SeededQuiz {
    pub id: i64,
    pub subject_id: i64,
    pub questions: Vec<SeededQuestion>,
}

/// Fresh in-memory database with the schema applied.
///
/// A single connection keeps the in-memory database alive and serializes
/// transactions the way the store's write lock would.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

/// File-backed WAL database opened the way the server opens it, with
/// several connections so transactions really contend.
///
/// The returned directory owns the file; keep it alive for the test.
pub async fn file_pool(max_connections: u32) -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("quiz.db");

    let config = Config {
        database_url: format!("sqlite://{}", path.display()),
        jwt_secret: "test-secret".to_string(),
        rust_log: "info".to_string(),
        bind_addr: "127.0.0.1:0".parse().expect("valid socket address"),
        db_max_connections: max_connections,
        cors_origins: Vec::new(),
    };

    let pool = db::connect(&config)
        .await
        .expect("Failed to open file database");

    MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    (pool, dir)
}

pub async fn seed_user(pool: &SqlitePool, username: &str, role: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
        .bind(username)
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_student(pool: &SqlitePool, username: &str) -> i64 {
    let id = seed_user(pool, username, "student").await;
    sqlx::query("INSERT INTO students (user_id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn seed_subject(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO subjects (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn add_question(pool: &SqlitePool, quiz_id: i64, text: &str) -> SeededQuestion {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO questions (quiz_id, text) VALUES ($1, $2) RETURNING id")
            .bind(quiz_id)
            .bind(text)
            .fetch_one(pool)
            .await
            .unwrap();

    let correct = add_answer(pool, id, &format!("{} right", text), true).await;
    let wrong = add_answer(pool, id, &format!("{} wrong", text), false).await;

    SeededQuestion { id, correct, wrong }
}

pub async fn add_answer(pool: &SqlitePool, question_id: i64, text: &str, is_correct: bool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO answers (question_id, text, is_correct) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(question_id)
    .bind(text)
    .bind(is_correct)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Quiz with `question_count` two-option questions.
pub async fn seed_quiz(
    pool: &SqlitePool,
    subject_id: i64,
    name: &str,
    question_count: usize,
) -> SeededQuiz {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO quizzes (name, subject_id) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(subject_id)
            .fetch_one(pool)
            .await
            .unwrap();

    let mut questions = Vec::with_capacity(question_count);
    for i in 0..question_count {
        questions.push(add_question(pool, id, &format!("{} Q{}", name, i + 1)).await);
    }

    SeededQuiz {
        id,
        subject_id,
        questions,
    }
}

pub async fn count_rows(pool: &SqlitePool, sql: &str, student_id: i64) -> i64 {
    sqlx::query_scalar(sql)
        .bind(student_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
