use platform_core::{OrganizationId, UserId};

/// Principal making the request.
///
/// Inserted by [`owner_middleware`](crate::middleware::owner_middleware);
/// resource routes only expose rows owned by this user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    user_id: UserId,
    organization_id: Option<OrganizationId>,
}

impl OwnerContext {
    pub fn new(user_id: UserId, organization_id: Option<OrganizationId>) -> Self {
        Self {
            user_id,
            organization_id,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn organization_id(&self) -> Option<&OrganizationId> {
        self.organization_id.as_ref()
    }
}
