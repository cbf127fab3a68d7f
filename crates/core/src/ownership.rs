//! Ownership columns shared by user-owned models.

use serde::{Deserialize, Serialize};

use crate::id::{OrganizationId, UserId};

/// `user_id` / `organization_id` pair.
///
/// Embed with `#[serde(flatten)]`; the relationship to actual user and
/// organization records lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    pub user_id: UserId,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
}

impl Ownership {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            organization_id: None,
        }
    }

    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }
}

/// Models owned by a user and optionally an organization.
pub trait Owned {
    fn ownership(&self) -> &Ownership;

    fn user_id(&self) -> &UserId {
        &self.ownership().user_id
    }

    fn organization_id(&self) -> Option<&OrganizationId> {
        self.ownership().organization_id.as_ref()
    }

    fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id() == user_id
    }
}

impl Owned for Ownership {
    fn ownership(&self) -> &Ownership {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn organization_is_optional() {
        let owner = Ownership::user(user("u1"));
        assert_eq!(owner.organization_id(), None);
        assert!(owner.is_owned_by(&user("u1")));
        assert!(!owner.is_owned_by(&user("u2")));

        let json = serde_json::to_value(&owner).unwrap();
        assert_eq!(json, serde_json::json!({ "user_id": "u1", "organization_id": null }));
    }

    #[test]
    fn missing_user_id_is_rejected() {
        let err = serde_json::from_value::<Ownership>(serde_json::json!({ "organization_id": "o1" }));
        assert!(err.is_err());

        let ok: Ownership = serde_json::from_value(serde_json::json!({ "user_id": "u1" })).unwrap();
        assert_eq!(ok.organization_id, None);
    }

    #[test]
    fn with_organization_sets_tenant() {
        let org = OrganizationId::new("org-9").unwrap();
        let owner = Ownership::user(user("u1")).with_organization(org.clone());
        assert_eq!(owner.organization_id(), Some(&org));
    }
}
