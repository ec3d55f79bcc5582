// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'subjects' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    /// Display color, e.g. "#007bff".
    pub color: String,
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    /// Teacher who authored the quiz.
    pub owner_id: Option<i64>,
    pub name: String,
    pub subject_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'questions' table in the database.
/// The integer `id` doubles as the creation-order key.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Answer option sent to a student (excludes `is_correct`).
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOption {
    pub id: i64,
    pub text: String,
}

impl From<Answer> for AnswerOption {
    fn from(answer: Answer) -> Self {
        Self {
            id: answer.id,
            text: answer.text,
        }
    }
}

/// DTO for the question currently offered to a student.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub answers: Vec<AnswerOption>,
}

/// A quiz the student can still take, joined with its subject.
#[derive(Debug, Serialize, FromRow)]
pub struct AvailableQuiz {
    pub id: i64,
    pub name: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub subject_color: String,
    pub questions_count: i64,
    /// Whether the quiz's subject is one of the student's courses.
    #[sqlx(skip)]
    pub in_courses: bool,
}
