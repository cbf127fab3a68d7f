//! Strongly-typed identifiers used across the model layer.
//!
//! Every identifier is stored as a string so it maps 1:1 onto the `TEXT`
//! primary/foreign key columns of the backing tables.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Primary key of a persistent model.
///
/// Always a hyphenated, lowercase UUID string. The only way to obtain one
/// without parsing is [`ModelId::new`], which models call from their
/// constructors so identity exists before any session sees the entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelId {
    uuid: Uuid,
    text: String,
}

impl ModelId {
    /// Generate a fresh random (v4) identifier.
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            text: uuid.hyphenated().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_uuid(&self) -> Uuid {
        self.uuid
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ModelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<Uuid> for ModelId {
    fn from(value: Uuid) -> Self {
        Self::from_uuid(value)
    }
}

impl From<ModelId> for String {
    fn from(value: ModelId) -> Self {
        value.text
    }
}

impl FromStr for ModelId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s)
            .map_err(|e| DomainError::invalid_id(format!("ModelId: {e}")))?;
        Ok(Self::from_uuid(uuid))
    }
}

impl TryFrom<String> for ModelId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identifier of the principal owning a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Identifier of the organization (tenant) owning a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationId(String);

macro_rules! impl_string_key {
    ($t:ident, $name:literal) => {
        impl $t {
            /// Wrap an externally issued key. Only emptiness is rejected; the
            /// format belongs to whoever issues these keys.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, ": empty")));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_key!(UserId, "UserId");
impl_string_key!(OrganizationId, "OrganizationId");

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_id_is_a_hyphenated_uuid() {
        let id = ModelId::new();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.as_str(), parsed.hyphenated().to_string());
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<ModelId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn parse_normalises_case() {
        let upper = "6F9619FF-8B86-D011-B42D-00CF4FC964FF";
        let id: ModelId = upper.parse().unwrap();
        assert_eq!(id.as_str(), upper.to_lowercase());
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id = ModelId::new();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));

        let bad = serde_json::from_value::<ModelId>(serde_json::json!("nope"));
        assert!(bad.is_err());
    }

    #[test]
    fn uuid_and_text_agree() {
        let uuid = Uuid::new_v4();
        let id = ModelId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
        assert_eq!(id.as_str().parse::<Uuid>().unwrap(), uuid);

        let parsed: ModelId = serde_json::from_value(serde_json::json!(id.as_str())).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.as_uuid(), uuid);
    }

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::new("  ").is_err());
        assert_eq!(UserId::new("auth0|abc").unwrap().as_str(), "auth0|abc");
        assert!(serde_json::from_value::<OrganizationId>(serde_json::json!("")).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: independently generated ids never collide within a batch.
        #[test]
        fn generated_ids_are_distinct(n in 2usize..200) {
            let ids: std::collections::HashSet<_> = (0..n).map(|_| ModelId::new()).collect();
            prop_assert_eq!(ids.len(), n);
        }

        /// Property: any UUID round-trips through the string form unchanged.
        #[test]
        fn any_uuid_parses_back(bytes in any::<[u8; 16]>()) {
            let uuid = Uuid::from_bytes(bytes);
            let id = ModelId::from_uuid(uuid);
            let back: ModelId = id.as_str().parse().unwrap();
            prop_assert_eq!(back.as_uuid(), uuid);
        }
    }
}
