//! HTTP application wiring (Axum router + session wiring).
//!
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use platform_db::SessionFactory;

use crate::middleware;

pub mod errors;
pub mod routes;

/// Shared handler state: where sessions come from.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<dyn SessionFactory>,
}

impl AppState {
    pub fn new(sessions: impl SessionFactory + 'static) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }

    pub fn sessions(&self) -> &dyn SessionFactory {
        &*self.sessions
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Build the full HTTP router around the given resource routes.
///
/// `resources` is typically a set of [`routes::resource::router`] instances
/// nested under their paths; they run behind the owner middleware.
pub fn build_app(state: AppState, resources: Router) -> Router {
    let protected = resources
        .layer(Extension(state))
        .layer(axum::middleware::from_fn(middleware::owner_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
