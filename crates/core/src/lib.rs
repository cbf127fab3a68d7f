//! `platform-core`: model building blocks.
//!
//! This crate contains **pure** primitives (no storage or HTTP concerns):
//! identifiers, the entity/tracked/ownership contracts and the structured
//! HTTP failure used to surface absence to the request layer.

pub mod entity;
pub mod error;
pub mod id;
pub mod ownership;
pub mod tracked;

pub use entity::Entity;
pub use error::{DomainError, HttpError};
pub use id::{ModelId, OrganizationId, UserId};
pub use ownership::{Owned, Ownership};
pub use tracked::{Timestamps, TrackedModel};
