//! Generic routes for owned, tracked models.
//!
//! Each handler owns exactly one session: it opens it, hands it to the model
//! operations and ends it (commit on success, rollback otherwise).

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use platform_core::{Owned, TrackedModel};
use platform_db::{Model, ModelError, Session};

use crate::app::AppState;
use crate::app::errors::ApiError;
use crate::context::OwnerContext;

/// `GET /:id` (read) and `DELETE /:id` (soft delete) for `M`.
pub fn router<M>() -> Router
where
    M: Model + TrackedModel + Owned,
    M::Schema: Send + 'static,
{
    Router::new().route("/:id", get(get_resource::<M>).delete(delete_resource::<M>))
}

pub async fn get_resource<M>(
    Extension(state): Extension<AppState>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> Result<Json<M::Schema>, ApiError>
where
    M: Model + TrackedModel + Owned,
    M::Schema: Send + 'static,
{
    let mut session = state.sessions().begin().await?;
    let loaded = load_visible::<M>(&mut *session, &owner, &id).await;
    end_quietly(session).await;

    Ok(Json(loaded?.to_schema()))
}

pub async fn delete_resource<M>(
    Extension(state): Extension<AppState>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    M: Model + TrackedModel + Owned,
{
    let mut session = state.sessions().begin().await?;
    match soft_delete::<M>(&mut *session, &owner, &id).await {
        Ok(model) => {
            session.commit().await?;
            tracing::info!(table = M::TABLE.name, id = %model.id(), "soft deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            end_quietly(session).await;
            Err(err.into())
        }
    }
}

/// `get_or_404`, with soft-deleted and foreign rows reported the same way
/// as missing ones.
async fn load_visible<M>(
    session: &mut dyn Session,
    owner: &OwnerContext,
    id: &str,
) -> Result<M, ModelError>
where
    M: Model + TrackedModel + Owned,
{
    let model = M::get_or_404(session, id).await?;
    if model.is_deleted() || !visible_to(&model, owner) {
        return Err(ModelError::not_found(M::model_name(), id));
    }
    Ok(model)
}

async fn soft_delete<M>(
    session: &mut dyn Session,
    owner: &OwnerContext,
    id: &str,
) -> Result<M, ModelError>
where
    M: Model + TrackedModel + Owned,
{
    let mut model = load_visible::<M>(session, owner, id).await?;
    model.mark_deleted();
    model.save(session).await
}

/// Owned by the user, or shared through the same organization.
fn visible_to<M: Owned>(model: &M, owner: &OwnerContext) -> bool {
    if model.is_owned_by(owner.user_id()) {
        return true;
    }
    matches!(
        (model.organization_id(), owner.organization_id()),
        (Some(a), Some(b)) if a == b
    )
}

async fn end_quietly(session: Box<dyn Session>) {
    if let Err(err) = session.rollback().await {
        tracing::warn!(error = %err, "session rollback failed");
    }
}
