// src/models/response.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'student_answers' table in the database.
/// One row per (student, question); never updated or deleted by the engine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudentAnswer {
    pub id: i64,
    pub student_id: i64,
    pub question_id: i64,
    pub answer_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting the answer to the offered question.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(range(min = 1))]
    pub question_id: i64,
    #[validate(range(min = 1))]
    pub answer_id: i64,
}
