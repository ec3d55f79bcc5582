// src/engine/progress.rs

use serde::Serialize;
use sqlx::{Executor, Sqlite, SqliteConnection};

use super::{EngineError, completion};
use crate::models::quiz::Question;

/// Lifecycle of one student's attempt at one quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    NotStarted,
    InProgress,
    Completed,
}

/// Questions of `quiz_id` the student has not answered yet, in creation order.
///
/// Always read live from the store; called again after every submission.
pub async fn unanswered_questions<'e, E>(
    executor: E,
    student_id: i64,
    quiz_id: i64,
) -> Result<Vec<Question>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT q.id, q.quiz_id, q.text, q.created_at
        FROM questions q
        WHERE q.quiz_id = $2
          AND NOT EXISTS (
              SELECT 1 FROM student_answers sa
              WHERE sa.student_id = $1 AND sa.question_id = q.id
          )
        ORDER BY q.id
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_all(executor)
    .await?;

    Ok(questions)
}

/// Number of questions of `quiz_id` the student has answered.
pub async fn answered_count<'e, E>(
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
        JOIN questions q ON q.id = sa.question_id
        WHERE sa.student_id = $1 AND q.quiz_id = $2
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// First unanswered question, or `None` when every question has a response.
///
/// Fails with [`EngineError::AlreadyCompleted`] once a taken-quiz record exists,
/// so callers redirect to the result instead of rendering a stale question.
pub async fn next_question(
    conn: &mut SqliteConnection,
    student_id: i64,
    quiz_id: i64,
) -> Result<Option<Question>, EngineError> {
    if completion::find_completion(&mut *conn, student_id, quiz_id)
        .await?
        .is_some()
    {
        return Err(EngineError::AlreadyCompleted { quiz_id });
    }

    let unanswered = unanswered_questions(&mut *conn, student_id, quiz_id).await?;
    Ok(unanswered.into_iter().next())
}

/// Percentage of the quiz done once the question on screen is answered.
///
/// `remaining` is the unanswered count *including* the question being shown.
/// Halves round to even and the result is clamped into `0..=100`.
pub fn progress_percent(total_questions: i64, remaining: i64) -> Result<u8, EngineError> {
    if total_questions <= 0 {
        return Err(EngineError::InvalidState(format!(
            "progress requested for a quiz with {} questions",
            total_questions
        )));
    }
    if remaining < 0 {
        return Err(EngineError::InvalidState(format!(
            "negative remaining count {}",
            remaining
        )));
    }

    let pending = ((remaining - 1) as f64 / total_questions as f64) * 100.0;
    let progress = 100.0 - pending.round_ties_even();

    Ok(progress.clamp(0.0, 100.0) as u8)
}

/// Fixes the scoring denominator for this attempt and returns it.
///
/// The first call stores the quiz's current question count; later calls
/// return the stored value even if questions were added since.
pub async fn capture_attempt(
    conn: &mut SqliteConnection,
    student_id: i64,
    quiz_id: i64,
) -> Result<i64, EngineError> {
    sqlx::query(
        r#"
        INSERT INTO quiz_attempts (student_id, quiz_id, total_questions)
        SELECT $1, $2, COUNT(*) FROM questions WHERE quiz_id = $2
        GROUP BY quiz_id
        ON CONFLICT (student_id, quiz_id) DO NOTHING
        "#,
    )
    .bind(student_id)
    .bind(quiz_id)
    .execute(&mut *conn)
    .await?;

    captured_total(&mut *conn, student_id, quiz_id)
        .await?
        .ok_or_else(|| {
            tracing::error!("Quiz {} has no questions but was offered", quiz_id);
            EngineError::InvalidState(format!("quiz {} has no questions", quiz_id))
        })
}

/// Denominator captured when the quiz was first offered, if any.
pub async fn captured_total<'e, E>(
    executor: E,
    student_id: i64,
    quiz_id: i64,
) -> Result<Option<i64>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let total: Option<i64> = sqlx::query_scalar(
        "SELECT total_questions FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2",
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_optional(executor)
    .await?;

    Ok(total)
}

pub async fn quiz_state(
    conn: &mut SqliteConnection,
    student_id: i64,
    quiz_id: i64,
) -> Result<QuizState, EngineError> {
    if completion::find_completion(&mut *conn, student_id, quiz_id)
        .await?
        .is_some()
    {
        return Ok(QuizState::Completed);
    }

    let answered = answered_count(&mut *conn, student_id, quiz_id).await?;
    Ok(if answered == 0 {
        QuizState::NotStarted
    } else {
        QuizState::InProgress
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_first_question() {
        // 4 questions, none answered: the first one is on screen.
        assert_eq!(progress_percent(4, 4).unwrap(), 25);
    }

    #[test]
    fn test_progress_last_question() {
        assert_eq!(progress_percent(4, 1).unwrap(), 100);
        assert_eq!(progress_percent(1, 1).unwrap(), 100);
    }

    #[test]
    fn test_progress_rounds_half_to_even() {
        // (1 / 8) * 100 = 12.5 rounds to 12.
        assert_eq!(progress_percent(8, 2).unwrap(), 88);
        // (3 / 8) * 100 = 37.5 rounds to 38.
        assert_eq!(progress_percent(8, 4).unwrap(), 62);
    }

    #[test]
    fn test_progress_thirds() {
        assert_eq!(progress_percent(3, 3).unwrap(), 33);
        assert_eq!(progress_percent(3, 2).unwrap(), 67);
    }

    #[test]
    fn test_progress_clamps_when_questions_were_added() {
        // Denominator captured at 4, but 6 questions are now unanswered.
        assert_eq!(progress_percent(4, 6).unwrap(), 0);
        assert_eq!(progress_percent(4, 0).unwrap(), 100);
    }

    #[test]
    fn test_progress_rejects_empty_quiz() {
        assert!(matches!(
            progress_percent(0, 0),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(
            progress_percent(3, -1),
            Err(EngineError::InvalidState(_))
        ));
    }
}
