use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

/// One atomic unit spanning a multi-table operation.
///
/// Statements run on [`UnitOfWork::conn`]. Nothing is visible to other
/// connections until [`UnitOfWork::commit`]; dropping the unit without
/// committing (e.g. on an early `?` return) rolls the transaction back.
///
/// Write units take SQLite's write lock when they begin, so the checks they
/// run before writing see every earlier committed write and concurrent
/// writers queue on the busy timeout instead of failing mid-transaction.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    operation: &'static str,
}

impl UnitOfWork {
    /// Acquire a pooled connection and open a write transaction on it
    pub async fn begin(pool: &SqlitePool, operation: &'static str) -> Result<Self, sqlx::Error> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
        tracing::debug!(operation, "write transaction started");
        Ok(Self { tx, operation })
    }

    /// Open a read-only unit giving a consistent snapshot across queries
    pub async fn read(pool: &SqlitePool, operation: &'static str) -> Result<Self, sqlx::Error> {
        let tx = pool.begin().await?;
        tracing::debug!(operation, "read transaction started");
        Ok(Self { tx, operation })
    }

    /// Connection bound to this transaction
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await?;
        tracing::debug!(operation = self.operation, "transaction committed");
        Ok(())
    }

    /// Roll back explicitly, e.g. after a failed uniqueness check
    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await?;
        tracing::warn!(operation = self.operation, "transaction rolled back");
        Ok(())
    }
}
