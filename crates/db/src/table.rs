//! Static table metadata.
//!
//! Each model declares the columns of its table once, including which ones
//! the storage layer fills in by itself. Sessions read this to build their
//! statements (Postgres) or to emulate the same rules (in-memory store).

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::SessionError;
use crate::session::Row;

/// Name of the primary key column shared by every model table.
pub const ID_COLUMN: &str = "id";

/// Value produced by the storage layer rather than by application code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generated {
    /// Storage clock (`now()`).
    Now,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// Filled by storage on insert when the row leaves it null.
    pub on_insert: Option<Generated>,
    /// Overwritten by storage on every update.
    pub on_update: Option<Generated>,
}

impl Column {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            on_insert: None,
            on_update: None,
        }
    }

    pub const fn server_default_now(name: &'static str) -> Self {
        Self {
            name,
            on_insert: Some(Generated::Now),
            on_update: None,
        }
    }

    pub const fn on_update_now(name: &'static str) -> Self {
        Self {
            name,
            on_insert: None,
            on_update: Some(Generated::Now),
        }
    }

    /// Written by application code (as opposed to storage-managed).
    pub fn is_writable(&self) -> bool {
        self.on_insert.is_none() && self.on_update.is_none()
    }
}

pub const ID: Column = Column::new(ID_COLUMN);
pub const CREATE_DATE: Column = Column::server_default_now("create_date");
pub const UPDATE_DATE: Column = Column::on_update_now("update_date");
pub const DELETE_DATE: Column = Column::new("delete_date");
pub const USER_ID: Column = Column::new("user_id");
pub const ORGANIZATION_ID: Column = Column::new("organization_id");

/// Column list for a model table: `id`, the model's own columns, then the
/// requested groups (`tracked` audit dates, `owned` user/organization keys).
///
/// ```ignore
/// const TABLE: TableDef = TableDef::new(
///     "agent",
///     table_columns![Column::new("name"); owned, tracked],
/// );
/// ```
#[macro_export]
macro_rules! table_columns {
    (@acc [$($acc:expr,)*] tracked $($rest:ident)*) => {
        $crate::table_columns!(@acc [
            $($acc,)*
            $crate::table::CREATE_DATE,
            $crate::table::UPDATE_DATE,
            $crate::table::DELETE_DATE,
        ] $($rest)*)
    };
    (@acc [$($acc:expr,)*] owned $($rest:ident)*) => {
        $crate::table_columns!(@acc [
            $($acc,)*
            $crate::table::USER_ID,
            $crate::table::ORGANIZATION_ID,
        ] $($rest)*)
    };
    (@acc [$($acc:expr,)*]) => {
        &[$crate::table::ID, $($acc,)*]
    };
    ($($col:expr),* $(,)? $(; $($group:ident),* $(,)?)?) => {
        $crate::table_columns!(@acc [$($col,)*] $($($group)*)?)
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableDef {
    pub const fn new(name: &'static str, columns: &'static [Column]) -> Self {
        Self { name, columns }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check a row against the table and return its primary key.
    ///
    /// Rows must carry a string `id` and only declared columns.
    pub fn check_row(&self, row: &Row) -> Result<String, SessionError> {
        if let Some(unknown) = row.keys().find(|k| self.column(k).is_none()) {
            return Err(SessionError::invalid_row(
                self.name,
                format!("unknown column '{unknown}'"),
            ));
        }
        match row.get(ID_COLUMN) {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            _ => Err(SessionError::invalid_row(self.name, "missing string primary key 'id'")),
        }
    }

    /// Apply insert-time generation: storage-managed columns get their
    /// defaults, on-update columns start out null.
    pub fn prepare_insert(&self, row: &mut Row, now: DateTime<Utc>) {
        for col in self.columns {
            let current = row.get(col.name).cloned().unwrap_or(Value::Null);
            let value = match (col.on_insert, col.on_update) {
                (Some(Generated::Now), _) if current.is_null() => timestamp(now),
                (_, Some(_)) => Value::Null,
                _ => current,
            };
            row.insert(col.name.to_string(), value);
        }
    }

    /// Apply update-time generation against the stored row.
    ///
    /// Returns `None` when no writable column changed, in which case no
    /// update happens at all (and `update_date` is left alone).
    pub fn prepare_update(&self, stored: &Row, incoming: &Row, now: DateTime<Utc>) -> Option<Row> {
        let changed = self
            .columns
            .iter()
            .filter(|c| c.is_writable())
            .any(|c| field(incoming, c.name) != field(stored, c.name));
        if !changed {
            return None;
        }

        let mut row = Row::new();
        for col in self.columns {
            let value = if col.on_update.is_some() {
                timestamp(now)
            } else if col.on_insert.is_some() {
                field(stored, col.name)
            } else {
                field(incoming, col.name)
            };
            row.insert(col.name.to_string(), value);
        }
        Some(row)
    }
}

fn field(row: &Row, name: &str) -> Value {
    row.get(name).cloned().unwrap_or(Value::Null)
}

/// Storage representation of a timestamp (microsecond precision, UTC).
pub fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}
