// src/engine/completion.rs

use std::collections::{HashMap, HashSet};

use sqlx::{Executor, Sqlite, SqliteConnection};

use super::{EngineError, aggregate, catalog, error::is_unique_violation, progress};
use crate::models::{
    quiz::Answer,
    taken_quiz::{AnswerMark, QuizResult, ReviewedAnswer, ReviewedQuestion, TakenQuiz},
};

/// Upper bound of a stored percentage.
const MAX_PERCENTAGE: f64 = 100.0;

/// Percentage of correct answers, rounded to two decimals with ties to even.
///
/// `total_questions` is the denominator captured when the quiz was first
/// offered. Questions added mid-attempt can push `score` above it, so the
/// result is capped at 100.
pub fn score_percentage(score: i64, total_questions: i64) -> Result<f64, EngineError> {
    if total_questions <= 0 {
        return Err(EngineError::InvalidState(format!(
            "cannot score against {} questions",
            total_questions
        )));
    }

    let raw = (score as f64 / total_questions as f64) * 100.0;
    let rounded = (raw * 100.0).round_ties_even() / 100.0;
    Ok(rounded.clamp(0.0, MAX_PERCENTAGE))
}

pub async fn find_completion<'e, E>(
    executor: E,
    student_id: i64,
    quiz_id: i64,
) -> Result<Option<TakenQuiz>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let record = sqlx::query_as::<_, TakenQuiz>(
        r#"
        SELECT id, student_id, quiz_id, score, percentage, date
        FROM taken_quizzes
        WHERE student_id = $1 AND quiz_id = $2
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_optional(executor)
    .await?;

    Ok(record)
}

/// Count of the student's responses in this quiz that picked a correct answer.
pub async fn correct_count<'e, E>(
    executor: E,
    student_id: i64,
    quiz_id: i64,
) -> Result<i64, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM student_answers sa
        JOIN answers a ON a.id = sa.answer_id
        JOIN questions q ON q.id = a.question_id
        WHERE sa.student_id = $1 AND q.quiz_id = $2 AND a.is_correct = 1
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

async fn insert_completion(
    conn: &mut SqliteConnection,
    student_id: i64,
    quiz_id: i64,
    score: i64,
    percentage: f64,
) -> Result<TakenQuiz, EngineError> {
    sqlx::query_as::<_, TakenQuiz>(
        r#"
        INSERT INTO taken_quizzes (student_id, quiz_id, score, percentage)
        VALUES ($1, $2, $3, $4)
        RETURNING id, student_id, quiz_id, score, percentage, date
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .bind(score)
    .bind(percentage)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            EngineError::DuplicateCompletion {
                student_id,
                quiz_id,
            }
        } else {
            tracing::error!("Failed to insert taken quiz: {:?}", e);
            EngineError::from(e)
        }
    })
}

/// Writes the taken-quiz record if the student has answered every question.
///
/// Runs in the same transaction as the answer that may have finished the quiz.
/// Returns `None` while questions remain. When another request already wrote
/// the record, that record is returned unchanged.
pub async fn try_complete(
    conn: &mut SqliteConnection,
    student_id: i64,
    quiz_id: i64,
) -> Result<Option<TakenQuiz>, EngineError> {
    let remaining = progress::unanswered_questions(&mut *conn, student_id, quiz_id).await?;
    if !remaining.is_empty() {
        return Ok(None);
    }

    let total_questions = progress::capture_attempt(&mut *conn, student_id, quiz_id).await?;
    let score = correct_count(&mut *conn, student_id, quiz_id).await?;
    let percentage = score_percentage(score, total_questions)?;

    let record = match insert_completion(conn, student_id, quiz_id, score, percentage).await {
        Ok(record) => record,
        Err(EngineError::DuplicateCompletion { .. }) => {
            tracing::info!(
                student_id,
                quiz_id,
                "Quiz already completed by a concurrent request, keeping the first record"
            );
            let existing = find_completion(&mut *conn, student_id, quiz_id)
                .await?
                .ok_or_else(|| {
                    EngineError::InvalidState(format!(
                        "duplicate completion for quiz {} but no record found",
                        quiz_id
                    ))
                })?;
            return Ok(Some(existing));
        }
        Err(e) => return Err(e),
    };

    let total_score = aggregate::refresh_score(&mut *conn, student_id).await?;

    tracing::info!(
        student_id,
        quiz_id,
        score,
        percentage,
        total_score,
        "Quiz completed"
    );

    Ok(Some(record))
}

/// Result review for a completed quiz, with the student's picks marked.
pub async fn completion_result(
    conn: &mut SqliteConnection,
    student_id: i64,
    quiz_id: i64,
) -> Result<QuizResult, EngineError> {
    let quiz = catalog::get_quiz(&mut *conn, quiz_id).await?;
    let record = find_completion(&mut *conn, student_id, quiz_id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!("result of quiz {} for student {}", quiz_id, student_id))
        })?;

    let questions = catalog::get_questions_for_quiz(&mut *conn, quiz_id).await?;
    let answers = catalog::get_answers_for_quiz(&mut *conn, quiz_id).await?;

    let chosen: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT sa.answer_id
        FROM student_answers sa
        JOIN questions q ON q.id = sa.question_id
        WHERE sa.student_id = $1 AND q.quiz_id = $2
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .collect();

    let mut by_question: HashMap<i64, Vec<Answer>> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id).or_default().push(answer);
    }

    let questions = questions
        .into_iter()
        .map(|q| ReviewedQuestion {
            answers: by_question
                .remove(&q.id)
                .unwrap_or_default()
                .into_iter()
                .map(|a| ReviewedAnswer {
                    mark: mark_answer(&a, &chosen),
                    id: a.id,
                    text: a.text,
                    is_correct: a.is_correct,
                })
                .collect(),
            id: q.id,
            text: q.text,
        })
        .collect();

    Ok(QuizResult {
        quiz_id: quiz.id,
        quiz_name: quiz.name,
        score: record.score,
        percentage: record.percentage,
        questions,
    })
}

fn mark_answer(answer: &Answer, chosen: &HashSet<i64>) -> Option<AnswerMark> {
    if !chosen.contains(&answer.id) {
        return None;
    }
    Some(if answer.is_correct {
        AnswerMark::Correct
    } else {
        AnswerMark::Wrong
    })
}
