// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::quiz::Subject;

/// A student joined with the user identity it wraps.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub username: String,
    /// Sum of `score` over the student's taken quizzes.
    pub score: i64,
}

/// Row of the students leaderboard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub student_id: i64,
    pub username: String,
    pub score: i64,
}

/// Query string for the leaderboard.
#[derive(Debug, Deserialize, Validate)]
pub struct LeaderboardParams {
    /// Case-insensitive username prefix.
    #[validate(length(max = 50))]
    pub q: Option<String>,
}

/// Subject with the highest summed score for a student.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TopSubject {
    pub name: String,
    pub score: i64,
}

/// Aggregated profile data for the current student.
#[derive(Debug, Serialize)]
pub struct StudentProfile {
    pub id: i64,
    pub username: String,
    pub score: i64,
    pub top_subject: Option<TopSubject>,
    pub courses: Vec<Subject>,
}

/// DTO for replacing the student's enrolled subjects.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCoursesRequest {
    #[validate(length(max = 100))]
    pub subject_ids: Vec<i64>,
}
