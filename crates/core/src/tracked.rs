//! Audit timestamps and soft deletion.
//!
//! A tracked model carries three timestamps:
//!
//! - `create_date`: written by the storage layer on first insert, never again.
//! - `update_date`: written by the storage layer on every later update.
//! - `delete_date`: written only by [`TrackedModel::mark_deleted`].
//!
//! Soft deletion is a state change (`delete_date` becomes non-null), not a
//! row removal. Physically removing a row is a separate operation of the
//! persistence layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// The audit columns of a tracked model.
///
/// Embed with `#[serde(flatten)]` so the columns sit next to the model's own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    #[serde(default)]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delete_date: Option<DateTime<Utc>>,
}

impl Timestamps {
    pub fn is_deleted(&self) -> bool {
        self.delete_date.is_some()
    }

    /// True once the row has been written at least once.
    pub fn is_persisted(&self) -> bool {
        self.create_date.is_some()
    }
}

/// A model with audit timestamps and an external representation.
///
/// `to_schema` is the transport contract: every concrete tracked model must
/// say how it is exposed outside the persistence layer.
pub trait TrackedModel: Entity {
    /// External (transport) representation of the model.
    type Schema: Serialize;

    fn timestamps(&self) -> &Timestamps;

    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// Convert the model into its external representation.
    fn to_schema(&self) -> Self::Schema;

    /// Soft-delete in memory: sets `delete_date` to now.
    ///
    /// Persisting the change is the caller's job (save through a session).
    fn mark_deleted(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.timestamps_mut().delete_date = Some(Utc::now());
        self
    }

    /// Undo a soft delete in memory.
    fn restore(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.timestamps_mut().delete_date = None;
        self
    }

    fn create_date(&self) -> Option<DateTime<Utc>> {
        self.timestamps().create_date
    }

    fn update_date(&self) -> Option<DateTime<Utc>> {
        self.timestamps().update_date
    }

    fn delete_date(&self) -> Option<DateTime<Utc>> {
        self.timestamps().delete_date
    }

    fn is_deleted(&self) -> bool {
        self.timestamps().is_deleted()
    }
}
