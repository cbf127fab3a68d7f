//! Entity trait: identity + continuity across state changes.

use crate::id::ModelId;

/// Anything with a persistent identity.
///
/// Implementors assign the id in their constructor via [`ModelId::new`], so an
/// entity never exists without one.
pub trait Entity {
    /// Returns the entity identifier.
    fn id(&self) -> &ModelId;
}
