//! HTTP layer: failure mapping, per-request sessions and generic model routes.

pub mod app;
pub mod context;
pub mod middleware;
pub mod server;

pub use app::errors::{ApiError, json_error, model_error_to_response};
pub use app::routes::resource::router as resource_router;
pub use app::{AppState, build_app};
pub use context::OwnerContext;
