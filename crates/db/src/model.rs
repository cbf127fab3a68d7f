//! Base operations shared by every persistent model.
//!
//! A model is a plain struct that serializes to one row of its table. The
//! caller passes the session into each operation; models never hold one.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use platform_core::Entity;

use crate::error::ModelError;
use crate::session::{Row, Session};
use crate::table::TableDef;

/// Persistent model: identity + table mapping + `get`/`get_or_404`/`save`/`delete`.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Agent {
///     id: ModelId,
///     name: String,
///     #[serde(flatten)]
///     owner: Ownership,
///     #[serde(flatten)]
///     timestamps: Timestamps,
/// }
///
/// impl Model for Agent {
///     const TABLE: TableDef =
///         TableDef::new("agent", table_columns![Column::new("name"); owned, tracked]);
/// }
///
/// let agent = Agent::get_or_404(&mut *session, &id).await?;
/// ```
#[async_trait]
pub trait Model: Entity + Serialize + DeserializeOwned + Send + Sync + Sized + 'static {
    const TABLE: TableDef;

    /// Name used in messages (the bare type name by default).
    fn model_name() -> &'static str {
        bare_type_name(std::any::type_name::<Self>())
    }

    fn to_row(&self) -> Result<Row, ModelError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => Ok(row),
            Ok(other) => Err(ModelError::Encode {
                model: Self::model_name(),
                reason: format!("expected a JSON object, got {other}"),
            }),
            Err(e) => Err(ModelError::Encode {
                model: Self::model_name(),
                reason: e.to_string(),
            }),
        }
    }

    fn from_row(row: Row) -> Result<Self, ModelError> {
        serde_json::from_value(Value::Object(row)).map_err(|e| ModelError::Decode {
            model: Self::model_name(),
            reason: e.to_string(),
        })
    }

    /// Fetch by id. A missing row is `Ok(None)`, never an error.
    async fn get(session: &mut dyn Session, id: &str) -> Result<Option<Self>, ModelError> {
        let span = tracing::debug_span!("model.get", table = Self::TABLE.name, id);
        async move {
            match session.get_row(Self::TABLE, id).await? {
                Some(row) => Self::from_row(row).map(Some),
                None => Ok(None),
            }
        }
        .instrument(span)
        .await
    }

    /// Fetch by id, turning absence into a 404 `ModelError::NotFound`.
    async fn get_or_404(session: &mut dyn Session, id: &str) -> Result<Self, ModelError> {
        match Self::get(session, id).await? {
            Some(model) => Ok(model),
            None => {
                tracing::debug!(table = Self::TABLE.name, id, "not found");
                Err(ModelError::not_found(Self::model_name(), id))
            }
        }
    }

    /// Stage the model for writing and flush it (no commit).
    ///
    /// The returned value is re-read through the session, so values the
    /// storage fills in (`create_date`, `update_date`) are present on it.
    async fn save(self, session: &mut dyn Session) -> Result<Self, ModelError> {
        let id = self.id().to_string();
        let span = tracing::debug_span!("model.save", table = Self::TABLE.name, id = %id);
        async move {
            let row = self.to_row()?;
            session.add(Self::TABLE, row)?;
            session.flush().await?;
            match session.get_row(Self::TABLE, &id).await? {
                Some(row) => Self::from_row(row),
                None => Ok(self),
            }
        }
        .instrument(span)
        .await
    }

    /// Stage the model for removal (no flush, no commit).
    async fn delete(self, session: &mut dyn Session) -> Result<Self, ModelError> {
        tracing::debug!(table = Self::TABLE.name, id = %self.id(), "delete staged");
        session.delete_row(Self::TABLE, self.id().as_str());
        Ok(self)
    }
}

/// Last path segment of a type name, without generic arguments:
/// `app::Wrapper<app::Payload>` is `Wrapper`.
fn bare_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}
