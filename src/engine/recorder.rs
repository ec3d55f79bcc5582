// src/engine/recorder.rs

use sqlx::SqliteConnection;

use super::{
    EngineError, catalog,
    error::{is_foreign_key_violation, is_unique_violation},
};
use crate::models::response::StudentAnswer;

/// Persists the student's choice for one question.
///
/// Must run inside the caller's [`super::UnitOfWork`]. The existence check and
/// the insert share that transaction, and the `(student_id, question_id)`
/// unique constraint rejects whichever concurrent writer commits second.
/// Nothing besides the single `student_answers` row is written here.
pub async fn record_answer(
    conn: &mut SqliteConnection,
    student_id: i64,
    question_id: i64,
    answer_id: i64,
) -> Result<StudentAnswer, EngineError> {
    let answer = catalog::get_answer(&mut *conn, answer_id).await?;
    if answer.question_id != question_id {
        return Err(EngineError::InvalidAnswer {
            question_id,
            answer_id,
        });
    }

    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM student_answers WHERE student_id = $1 AND question_id = $2",
    )
    .bind(student_id)
    .bind(question_id)
    .fetch_optional(&mut *conn)
    .await?;

    if existing.is_some() {
        return Err(EngineError::DuplicateAnswer {
            student_id,
            question_id,
        });
    }

    let recorded = sqlx::query_as::<_, StudentAnswer>(
        r#"
        INSERT INTO student_answers (student_id, question_id, answer_id)
        VALUES ($1, $2, $3)
        RETURNING id, student_id, question_id, answer_id, created_at
        "#,
    )
    .bind(student_id)
    .bind(question_id)
    .bind(answer_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            EngineError::DuplicateAnswer {
                student_id,
                question_id,
            }
        } else if is_foreign_key_violation(&e) {
            EngineError::NotFound(format!("student {}", student_id))
        } else {
            tracing::error!("Failed to insert student answer: {:?}", e);
            EngineError::from(e)
        }
    })?;

    tracing::debug!(
        student_id,
        question_id,
        answer_id,
        "Recorded student answer {}",
        recorded.id
    );

    Ok(recorded)
}
