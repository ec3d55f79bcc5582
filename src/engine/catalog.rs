// src/engine/catalog.rs

//! Read-only access to the teacher-authored catalog and to student identities.

use sqlx::{Executor, Sqlite};

use super::EngineError;
use crate::models::{
    quiz::{Answer, Question, Quiz, Subject},
    student::Student,
};

pub async fn get_quiz<'e, E>(executor: E, quiz_id: i64) -> Result<Quiz, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Quiz>(
        "SELECT id, owner_id, name, subject_id, created_at FROM quizzes WHERE id = $1",
    )
    .bind(quiz_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| EngineError::NotFound(format!("quiz {}", quiz_id)))
}

/// Questions of a quiz in creation order.
pub async fn get_questions_for_quiz<'e, E>(
    executor: E,
    quiz_id: i64,
) -> Result<Vec<Question>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, text, created_at FROM questions WHERE quiz_id = $1 ORDER BY id",
    )
    .bind(quiz_id)
    .fetch_all(executor)
    .await?;

    Ok(questions)
}

/// Fetches a question, requiring it to belong to `quiz_id`.
pub async fn get_question_in_quiz<'e, E>(
    executor: E,
    quiz_id: i64,
    question_id: i64,
) -> Result<Question, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, text, created_at FROM questions WHERE id = $1 AND quiz_id = $2",
    )
    .bind(question_id)
    .bind(quiz_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| EngineError::NotFound(format!("question {} in quiz {}", question_id, quiz_id)))
}

pub async fn get_answers_for_question<'e, E>(
    executor: E,
    question_id: i64,
) -> Result<Vec<Answer>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let answers = sqlx::query_as::<_, Answer>(
        "SELECT id, question_id, text, is_correct FROM answers WHERE question_id = $1 ORDER BY id",
    )
    .bind(question_id)
    .fetch_all(executor)
    .await?;

    Ok(answers)
}

/// All answers of every question in a quiz, ordered by question then answer.
pub async fn get_answers_for_quiz<'e, E>(
    executor: E,
    quiz_id: i64,
) -> Result<Vec<Answer>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT a.id, a.question_id, a.text, a.is_correct
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE q.quiz_id = $1
        ORDER BY a.question_id, a.id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(executor)
    .await?;

    Ok(answers)
}

pub async fn get_answer<'e, E>(executor: E, answer_id: i64) -> Result<Answer, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Answer>(
        "SELECT id, question_id, text, is_correct FROM answers WHERE id = $1",
    )
    .bind(answer_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| EngineError::NotFound(format!("answer {}", answer_id)))
}

pub async fn count_questions<'e, E>(executor: E, quiz_id: i64) -> Result<i64, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = $1")
        .bind(quiz_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

pub async fn get_student<'e, E>(executor: E, student_id: i64) -> Result<Student, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Student>(
        r#"
        SELECT s.user_id AS id, u.username, s.score
        FROM students s
        JOIN users u ON u.id = s.user_id
        WHERE s.user_id = $1
        "#,
    )
    .bind(student_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| EngineError::NotFound(format!("student {}", student_id)))
}

pub async fn list_subjects<'e, E>(executor: E) -> Result<Vec<Subject>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let subjects = sqlx::query_as::<_, Subject>("SELECT id, name, color FROM subjects ORDER BY name")
        .fetch_all(executor)
        .await?;

    Ok(subjects)
}

/// Subjects the student is enrolled in, by name.
pub async fn student_courses<'e, E>(executor: E, student_id: i64) -> Result<Vec<Subject>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT s.id, s.name, s.color
        FROM subjects s
        JOIN student_courses sc ON sc.subject_id = s.id
        WHERE sc.student_id = $1
        ORDER BY s.name
        "#,
    )
    .bind(student_id)
    .fetch_all(executor)
    .await?;

    Ok(subjects)
}
