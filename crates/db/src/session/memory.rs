use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};

use super::{PendingOp, Row, Session, SessionFactory, UnitOfWork};
use crate::error::SessionError;
use crate::table::TableDef;

type Key = (&'static str, String);

/// In-memory backing store for tests/dev.
///
/// Cloning is cheap and every clone sees the same committed rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<HashMap<Key, Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a unit of work on this store.
    pub fn session(&self) -> MemorySession {
        MemorySession {
            store: self.clone(),
            work: UnitOfWork::new(),
            flushed: HashMap::new(),
        }
    }

    /// Committed row, bypassing any session.
    pub fn committed(&self, table: &TableDef, id: &str) -> Result<Option<Row>, SessionError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| SessionError::Storage("lock poisoned".to_string()))?;
        Ok(rows.get(&(table.name, id.to_string())).cloned())
    }

    /// Number of committed rows in a table.
    pub fn count(&self, table: &TableDef) -> Result<usize, SessionError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| SessionError::Storage("lock poisoned".to_string()))?;
        Ok(rows.keys().filter(|(t, _)| *t == table.name).count())
    }
}

#[async_trait]
impl SessionFactory for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Session>, SessionError> {
        Ok(Box::new(self.session()))
    }
}

/// Unit of work over a [`MemoryStore`].
///
/// Flushed writes live in a private overlay (`None` marks a flushed delete)
/// until commit publishes them to the store.
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
    work: UnitOfWork,
    flushed: HashMap<Key, Option<Row>>,
}

impl MemorySession {
    fn lookup(
        &self,
        overlay: &HashMap<Key, Option<Row>>,
        key: &Key,
    ) -> Result<Option<Row>, SessionError> {
        match overlay.get(key) {
            Some(row) => Ok(row.clone()),
            None => {
                let rows = self
                    .store
                    .rows
                    .read()
                    .map_err(|_| SessionError::Storage("lock poisoned".to_string()))?;
                Ok(rows.get(key).cloned())
            }
        }
    }

    fn apply(
        &self,
        overlay: &mut HashMap<Key, Option<Row>>,
        op: PendingOp,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        match op {
            PendingOp::Upsert { table, id, mut row } => {
                let key = (table.name, id);
                match self.lookup(overlay, &key)? {
                    Some(stored) => {
                        if let Some(updated) = table.prepare_update(&stored, &row, now) {
                            tracing::trace!(table = table.name, id = %key.1, "update");
                            overlay.insert(key, Some(updated));
                        }
                    }
                    None => {
                        table.prepare_insert(&mut row, now);
                        tracing::trace!(table = table.name, id = %key.1, "insert");
                        overlay.insert(key, Some(row));
                    }
                }
            }
            PendingOp::Delete { table, id } => {
                let key = (table.name, id);
                if self.lookup(overlay, &key)?.is_some() {
                    tracing::trace!(table = table.name, id = %key.1, "delete");
                    overlay.insert(key, None);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn get_row(&mut self, table: TableDef, id: &str) -> Result<Option<Row>, SessionError> {
        self.lookup(&self.flushed, &(table.name, id.to_string()))
    }

    fn add(&mut self, table: TableDef, row: Row) -> Result<(), SessionError> {
        self.work.add(table, row)
    }

    fn delete_row(&mut self, table: TableDef, id: &str) {
        self.work.delete(table, id)
    }

    async fn flush(&mut self) -> Result<(), SessionError> {
        if self.work.is_empty() {
            return Ok(());
        }

        // Same resolution as a Postgres timestamptz column.
        let now = Utc::now().trunc_subsecs(6);

        // All-or-nothing: apply on a copy, swap in on success. Pending
        // writes stay queued when any of them fails.
        let mut overlay = self.flushed.clone();
        for op in self.work.iter() {
            self.apply(&mut overlay, op.clone(), now)?;
        }
        self.flushed = overlay;
        let count = self.work.take().len();

        tracing::debug!(ops = count, "memory session flushed");
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), SessionError> {
        self.flush().await?;

        let mut rows = self
            .store
            .rows
            .write()
            .map_err(|_| SessionError::Storage("lock poisoned".to_string()))?;
        for (key, row) in self.flushed.drain() {
            match row {
                Some(row) => {
                    rows.insert(key, row);
                }
                None => {
                    rows.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), SessionError> {
        tracing::debug!(
            pending = self.work.len(),
            flushed = self.flushed.len(),
            "memory session rolled back"
        );
        Ok(())
    }

    fn pending_len(&self) -> usize {
        self.work.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use serde_json::{Value, json};

    const NOTES: TableDef = TableDef::new("notes", crate::table_columns![Column::new("body"); tracked]);

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn pending_rows_are_invisible_until_flush() {
        let store = MemoryStore::new();
        let mut session = store.session();

        session.add(NOTES, row(json!({ "id": "a", "body": "x" }))).unwrap();
        assert_eq!(session.pending_len(), 1);
        assert!(session.get_row(NOTES, "a").await.unwrap().is_none());

        session.flush().await.unwrap();
        assert_eq!(session.pending_len(), 0);
        let stored = session.get_row(NOTES, "a").await.unwrap().unwrap();
        assert!(stored["create_date"].is_string());
        assert!(stored["update_date"].is_null());
    }

    #[tokio::test]
    async fn flushed_rows_stay_private_until_commit() {
        let store = MemoryStore::new();
        let mut session = store.session();
        session.add(NOTES, row(json!({ "id": "a", "body": "x" }))).unwrap();
        session.flush().await.unwrap();

        let mut other = store.session();
        assert!(other.get_row(NOTES, "a").await.unwrap().is_none());
        assert_eq!(store.count(&NOTES).unwrap(), 0);

        Box::new(session).commit().await.unwrap();
        assert!(other.get_row(NOTES, "a").await.unwrap().is_some());
        assert_eq!(store.count(&NOTES).unwrap(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_flushed_writes() {
        let store = MemoryStore::new();
        let mut session = store.session();
        session.add(NOTES, row(json!({ "id": "a", "body": "x" }))).unwrap();
        session.flush().await.unwrap();
        Box::new(session).rollback().await.unwrap();

        assert!(store.committed(&NOTES, "a").unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_row_after_flush() {
        let store = MemoryStore::new();
        let mut session = store.session();
        session.add(NOTES, row(json!({ "id": "a", "body": "x" }))).unwrap();
        Box::new(session).commit().await.unwrap();

        let mut session = store.session();
        session.delete_row(NOTES, "a");
        assert!(session.get_row(NOTES, "a").await.unwrap().is_some());
        session.flush().await.unwrap();
        assert!(session.get_row(NOTES, "a").await.unwrap().is_none());
        assert!(store.committed(&NOTES, "a").unwrap().is_some());

        Box::new(session).commit().await.unwrap();
        assert!(store.committed(&NOTES, "a").unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_rows_are_rejected_on_add() {
        let store = MemoryStore::new();
        let mut session = store.session();
        let err = session.add(NOTES, row(json!({ "body": "x" }))).unwrap_err();
        assert!(matches!(err, SessionError::InvalidRow { table: "notes", .. }));
        assert_eq!(session.pending_len(), 0);
    }

    #[tokio::test]
    async fn second_write_stamps_update_date() {
        let store = MemoryStore::new();
        let mut session = store.session();
        session.add(NOTES, row(json!({ "id": "a", "body": "x" }))).unwrap();
        session.flush().await.unwrap();
        let first = session.get_row(NOTES, "a").await.unwrap().unwrap();

        let mut changed = first.clone();
        changed.insert("body".into(), json!("y"));
        session.add(NOTES, changed).unwrap();
        session.flush().await.unwrap();
        let second = session.get_row(NOTES, "a").await.unwrap().unwrap();

        assert_eq!(second["create_date"], first["create_date"]);
        assert!(second["update_date"].is_string());
        assert_eq!(second["body"], json!("y"));
    }

    fn poison(store: &MemoryStore) {
        let rows = store.rows.clone();
        let _ = std::thread::spawn(move || {
            let _guard = rows.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
    }

    #[tokio::test]
    async fn poisoned_store_reports_storage_errors() {
        let store = MemoryStore::new();
        poison(&store);

        assert!(matches!(store.count(&NOTES), Err(SessionError::Storage(_))));
        assert!(matches!(store.committed(&NOTES, "a"), Err(SessionError::Storage(_))));
    }

    #[tokio::test]
    async fn failed_flush_keeps_pending_writes() {
        let store = MemoryStore::new();
        let mut session = store.session();
        session.add(NOTES, row(json!({ "id": "a", "body": "x" }))).unwrap();
        session.add(NOTES, row(json!({ "id": "b", "body": "y" }))).unwrap();
        poison(&store);

        let err = session.flush().await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.pending_len(), 2);
        assert!(session.flushed.is_empty());
    }
}
