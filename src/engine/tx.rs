// src/engine/tx.rs

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::EngineError;

/// A scoped unit of work over one store transaction.
///
/// Dropping a `UnitOfWork` without calling [`UnitOfWork::commit`] rolls the
/// transaction back, so an early `?` return never leaves partial rows.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub async fn begin(pool: &SqlitePool) -> Result<Self, EngineError> {
        let tx = pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            EngineError::from(e)
        })?;
        Ok(Self { tx })
    }

    /// Connection bound to this transaction.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), EngineError> {
        self.tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit transaction: {:?}", e);
            EngineError::from(e)
        })
    }

    pub async fn rollback(self) -> Result<(), EngineError> {
        self.tx.rollback().await.map_err(EngineError::from)
    }
}
