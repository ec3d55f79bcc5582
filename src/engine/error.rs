// src/engine/error.rs

use thiserror::Error;

/// Failures surfaced by the quiz engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced quiz, question, answer or student does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The chosen answer is not one of the question's options.
    #[error("answer {answer_id} does not belong to question {question_id}")]
    InvalidAnswer { question_id: i64, answer_id: i64 },

    /// The student already answered this question.
    #[error("student {student_id} already answered question {question_id}")]
    DuplicateAnswer { student_id: i64, question_id: i64 },

    /// A completion record already exists for this student and quiz.
    #[error("student {student_id} already completed quiz {quiz_id}")]
    DuplicateCompletion { student_id: i64, quiz_id: i64 },

    /// The quiz is finished for this student; nothing left to offer.
    #[error("quiz {quiz_id} already completed")]
    AlreadyCompleted { quiz_id: i64 },

    /// Internal consistency fault, e.g. a quiz without questions.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Storage failure (I/O, pool, unexpected constraint).
    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Races that the engine resolves by returning the authoritative record.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EngineError::DuplicateAnswer { .. } | EngineError::DuplicateCompletion { .. }
        )
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => EngineError::NotFound("record".to_string()),
            other => EngineError::Storage(other.to_string()),
        }
    }
}

/// Returns `true` when the storage error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Returns `true` when the storage error is a foreign-key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_benign() {
        assert!(
            EngineError::DuplicateAnswer {
                student_id: 1,
                question_id: 2
            }
            .is_benign()
        );
        assert!(
            EngineError::DuplicateCompletion {
                student_id: 1,
                quiz_id: 2
            }
            .is_benign()
        );
        assert!(!EngineError::NotFound("quiz 1".to_string()).is_benign());
        assert!(!EngineError::InvalidState("empty quiz".to_string()).is_benign());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = EngineError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, EngineError::NotFound(_)));

        let err = EngineError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
