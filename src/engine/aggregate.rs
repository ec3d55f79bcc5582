// src/engine/aggregate.rs

use sqlx::{Executor, Sqlite, SqliteConnection};

use super::EngineError;
use crate::models::student::{LeaderboardEntry, TopSubject};

/// Lifetime score: the sum of every taken quiz's score.
pub fn cumulative_score<I>(scores: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    scores.into_iter().sum()
}

/// Recomputes `students.score` from the taken-quiz records and stores it.
///
/// Never applies a delta, so calling it again is harmless.
pub async fn refresh_score(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<i64, EngineError> {
    let scores: Vec<i64> =
        sqlx::query_scalar("SELECT score FROM taken_quizzes WHERE student_id = $1")
            .bind(student_id)
            .fetch_all(&mut *conn)
            .await?;

    let total = cumulative_score(scores);

    let result = sqlx::query("UPDATE students SET score = $1 WHERE user_id = $2")
        .bind(total)
        .bind(student_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(EngineError::NotFound(format!("student {}", student_id)));
    }

    Ok(total)
}

/// Escapes LIKE wildcards so the filter matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Students by score, highest first, optionally filtered by username prefix.
pub async fn leaderboard<'e, E>(
    executor: E,
    name_prefix: Option<&str>,
) -> Result<Vec<LeaderboardEntry>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let pattern = format!("{}%", escape_like(name_prefix.unwrap_or("").trim()));

    let entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT s.user_id AS student_id, u.username, s.score
        FROM students s
        JOIN users u ON u.id = s.user_id
        WHERE lower(u.username) LIKE lower($1) ESCAPE '\'
        ORDER BY s.score DESC, u.username ASC
        "#,
    )
    .bind(pattern)
    .fetch_all(executor)
    .await?;

    Ok(entries)
}

/// Subject where the student scored the most across taken quizzes.
pub async fn top_subject<'e, E>(
    executor: E,
    student_id: i64,
) -> Result<Option<TopSubject>, EngineError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let top = sqlx::query_as::<_, TopSubject>(
        r#"
        SELECT sub.name, SUM(t.score) AS score
        FROM taken_quizzes t
        JOIN quizzes q ON q.id = t.quiz_id
        JOIN subjects sub ON sub.id = q.subject_id
        WHERE t.student_id = $1
        GROUP BY sub.id, sub.name
        ORDER BY score DESC, sub.name ASC
        LIMIT 1
        "#,
    )
    .bind(student_id)
    .fetch_optional(executor)
    .await?;

    Ok(top)
}
