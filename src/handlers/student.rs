// src/handlers/student.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    engine::{aggregate, service},
    error::AppError,
    models::student::{LeaderboardParams, UpdateCoursesRequest},
    utils::jwt::Claims,
};

/// Students ordered by cumulative score, optionally filtered by `?q=` prefix.
pub async fn leaderboard(
    State(pool): State<SqlitePool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let entries = aggregate::leaderboard(&pool, params.q.as_deref()).await?;
    Ok(Json(entries))
}

/// Current student's score, top subject and courses.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let profile = service::student_profile(&pool, student_id).await?;
    Ok(Json(profile))
}

pub async fn update_courses(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCoursesRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let student_id = claims.user_id()?;
    let courses = service::update_courses(&pool, student_id, &req.subject_ids).await?;
    Ok(Json(courses))
}
