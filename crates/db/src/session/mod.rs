//! Session boundary: a caller-owned unit of work against a backing store.
//!
//! The model layer only ever *uses* a session (`get_row`, `add`,
//! `delete_row`, `flush`). Opening, committing and rolling back belong to
//! whoever owns the session, typically one request handler.

pub mod memory;
pub mod postgres;
pub mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SessionError;
use crate::table::TableDef;

pub use memory::{MemorySession, MemoryStore};
pub use postgres::PgSession;

/// A row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// A write waiting for the next flush.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    /// Insert the row, or update the existing row with the same id.
    Upsert { table: TableDef, id: String, row: Row },
    Delete { table: TableDef, id: String },
}

/// Ordered queue of pending writes, shared by the session implementations.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    ops: Vec<PendingOp>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, table: TableDef, row: Row) -> Result<(), SessionError> {
        let id = table.check_row(&row)?;
        self.ops.push(PendingOp::Upsert { table, id, row });
        Ok(())
    }

    pub fn delete(&mut self, table: TableDef, id: &str) {
        self.ops.push(PendingOp::Delete {
            table,
            id: id.to_string(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOp> {
        self.ops.iter()
    }

    pub fn take(&mut self) -> Vec<PendingOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Handle on an open unit of work.
///
/// Reads see everything flushed in this session plus everything committed
/// to the store. Pending (unflushed) writes are invisible to reads.
#[async_trait]
pub trait Session: Send {
    /// Look up a row by primary key.
    async fn get_row(&mut self, table: TableDef, id: &str) -> Result<Option<Row>, SessionError>;

    /// Register a row for insert-or-update at the next flush.
    fn add(&mut self, table: TableDef, row: Row) -> Result<(), SessionError>;

    /// Register a row for removal at the next flush.
    fn delete_row(&mut self, table: TableDef, id: &str);

    /// Apply pending writes without ending the unit of work.
    async fn flush(&mut self) -> Result<(), SessionError>;

    /// Flush and make the unit of work durable.
    async fn commit(self: Box<Self>) -> Result<(), SessionError>;

    /// Discard everything done in this unit of work.
    async fn rollback(self: Box<Self>) -> Result<(), SessionError>;

    /// Number of writes waiting for the next flush.
    fn pending_len(&self) -> usize;
}

/// Opens sessions; one per logical operation (e.g. per request).
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Session>, SessionError>;
}

#[async_trait]
impl<F> SessionFactory for Arc<F>
where
    F: SessionFactory + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn Session>, SessionError> {
        (**self).begin().await
    }
}
