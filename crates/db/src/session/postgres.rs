//! Postgres-backed session.
//!
//! A [`PgSession`] wraps one database transaction. Flushing executes the
//! pending statements inside it, so flushed rows are visible to later reads
//! through the same session and nowhere else until commit.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | SessionError |
//! |------------|----------------------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (not-null / foreign key / check) | `23502` / `23503` / `23514` | `Constraint` |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / other | N/A | `Database` |

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Row as _, Transaction};
use tracing::instrument;

use super::{PendingOp, Row, Session, SessionFactory, UnitOfWork, sql};
use crate::error::SessionError;
use crate::table::TableDef;

/// Unit of work over a Postgres transaction.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
    work: UnitOfWork,
}

impl PgSession {
    /// Begin a transaction on the pool.
    pub async fn begin(pool: &PgPool) -> Result<Self, SessionError> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Self {
            tx,
            work: UnitOfWork::new(),
        })
    }

    async fn execute(&mut self, op: PendingOp) -> Result<(), SessionError> {
        match op {
            PendingOp::Upsert { table, id, row } => {
                let statement = sql::upsert(&table, &row);
                let result = sqlx::query(&statement)
                    .bind(Value::Object(row))
                    .execute(&mut *self.tx)
                    .await
                    .map_err(|e| map_sqlx_error("upsert", e))?;
                tracing::trace!(table = table.name, %id, rows = result.rows_affected(), "upsert");
            }
            PendingOp::Delete { table, id } => {
                let result = sqlx::query(&sql::delete_by_id(&table))
                    .bind(id.as_str())
                    .execute(&mut *self.tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete", e))?;
                tracing::trace!(table = table.name, %id, rows = result.rows_affected(), "delete");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("pending", &self.work.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Session for PgSession {
    #[instrument(skip(self, table), fields(table = table.name), err)]
    async fn get_row(&mut self, table: TableDef, id: &str) -> Result<Option<Row>, SessionError> {
        let row = sqlx::query(&sql::select_by_id(&table))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get_row", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: Value = row
            .try_get("data")
            .map_err(|e| map_sqlx_error("decode_row", e))?;
        match value {
            Value::Object(map) => Ok(Some(map)),
            other => Err(SessionError::invalid_row(
                table.name,
                format!("expected a JSON object, got {other}"),
            )),
        }
    }

    fn add(&mut self, table: TableDef, row: Row) -> Result<(), SessionError> {
        self.work.add(table, row)
    }

    fn delete_row(&mut self, table: TableDef, id: &str) {
        self.work.delete(table, id)
    }

    #[instrument(skip(self), err)]
    async fn flush(&mut self) -> Result<(), SessionError> {
        let ops = self.work.take();
        let count = ops.len();
        for op in ops {
            self.execute(op).await?;
        }
        tracing::debug!(ops = count, "pg session flushed");
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), SessionError> {
        self.flush().await?;
        let PgSession { tx, .. } = *self;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), SessionError> {
        let PgSession { tx, .. } = *self;
        tx.rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }

    fn pending_len(&self) -> usize {
        self.work.len()
    }
}

#[async_trait]
impl SessionFactory for PgPool {
    async fn begin(&self) -> Result<Box<dyn Session>, SessionError> {
        Ok(Box::new(PgSession::begin(self).await?))
    }
}

/// Map SQLx errors to SessionError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> SessionError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => SessionError::Conflict(msg),
                Some("23502") | Some("23503") | Some("23514") => SessionError::Constraint(msg),
                _ => SessionError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            SessionError::Database(format!("connection pool closed in {}", operation))
        }
        _ => SessionError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
