// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    engine::{
        EngineError, completion,
        service::{self, QuestionOffer},
    },
    error::AppError,
    models::{response::SubmitAnswerRequest, taken_quiz::TakenQuiz},
    utils::jwt::Claims,
};

/// Body of `GET /api/quizzes/{id}/next`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum NextQuestionResponse {
    Question(QuestionOffer),
    /// Quiz already taken; the client should show the result instead.
    Completed { result: TakenQuiz },
}

/// Lists quizzes the student can still take, ordered by name.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let quizzes = service::available_quizzes(&pool, student_id).await?;
    Ok(Json(quizzes))
}

/// Lists the student's taken quizzes with score and percentage.
pub async fn list_taken_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let taken = service::taken_quizzes(&pool, student_id).await?;
    Ok(Json(taken))
}

/// Returns the next unanswered question with the progress bar value.
///
/// Once the quiz is taken the response carries the stored result so the
/// client can redirect.
pub async fn next_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let response = match service::offer_next_question(&pool, student_id, quiz_id).await {
        Ok(offer) => NextQuestionResponse::Question(offer),
        Err(EngineError::AlreadyCompleted { .. }) => {
            let result = completion::find_completion(&pool, student_id, quiz_id)
                .await?
                .ok_or_else(|| {
                    AppError::from(EngineError::InvalidState(format!(
                        "quiz {} reported completed without a record",
                        quiz_id
                    )))
                })?;
            NextQuestionResponse::Completed { result }
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(response))
}

/// Records the answer to the offered question.
///
/// * Answers `advance` while questions remain.
/// * Answers `completed` with the taken-quiz record after the last question.
/// * Replayed submissions get the stored outcome, not an error.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let student_id = claims.user_id()?;

    let outcome =
        service::submit_answer(&pool, student_id, quiz_id, req.question_id, req.answer_id).await?;

    Ok(Json(outcome))
}

/// Score, percentage and reviewed answers of a taken quiz.
pub async fn quiz_result(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let result = service::quiz_result(&pool, student_id, quiz_id).await?;
    Ok(Json(result))
}
