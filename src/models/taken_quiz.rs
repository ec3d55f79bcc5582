// src/models/taken_quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'taken_quizzes' table in the database.
/// Written once when the last question of a quiz is answered.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TakenQuiz {
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,
    /// Number of correct answers.
    pub score: i64,
    /// 0 to 100, two decimals.
    pub percentage: f64,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// Taken quiz joined with quiz and subject names, for listings.
#[derive(Debug, Serialize, FromRow)]
pub struct TakenQuizSummary {
    pub id: i64,
    pub quiz_id: i64,
    pub quiz_name: String,
    pub subject_name: String,
    pub score: i64,
    pub percentage: f64,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// How a student's choice relates to an answer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMark {
    Correct,
    Wrong,
}

#[derive(Debug, Serialize)]
pub struct ReviewedAnswer {
    pub id: i64,
    pub text: String,
    pub is_correct: bool,
    /// Set only on the option the student picked.
    pub mark: Option<AnswerMark>,
}

#[derive(Debug, Serialize)]
pub struct ReviewedQuestion {
    pub id: i64,
    pub text: String,
    pub answers: Vec<ReviewedAnswer>,
}

/// Result page of a completed quiz.
#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub score: i64,
    pub percentage: f64,
    pub questions: Vec<ReviewedQuestion>,
}
