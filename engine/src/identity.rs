//! Participant identity keys.
//!
//! The provider sometimes identifies a person by numeric id and sometimes only
//! by a free-text name (late call-ups, coaches, match officials). An
//! [`IdentityKey`] correlates the same person across the lineup, event and
//! statistics sources of one poll, and across successive polls of a fixture.
//!
//! The two variants never compare equal to each other, so an id-derived key
//! cannot collide with a name-derived key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable per-pass identifier for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum IdentityKey {
    /// Provider-assigned numeric id (always positive)
    ExternalId(i64),
    /// Display name, used when no usable id is present
    NameFallback(String),
}

impl IdentityKey {
    /// Derive a key from an optional external id and a display name.
    ///
    /// Returns `ExternalId` when the id is present and positive, otherwise
    /// `NameFallback` with the trimmed name. Never fails.
    pub fn resolve(external_id: Option<i64>, name: &str) -> Self {
        match external_id {
            Some(id) if id > 0 => IdentityKey::ExternalId(id),
            _ => IdentityKey::NameFallback(name.trim().to_string()),
        }
    }

    /// Like [`IdentityKey::resolve`], but returns `None` when the reference
    /// carries neither a usable id nor a non-blank name.
    pub fn from_parts(external_id: Option<i64>, name: Option<&str>) -> Option<Self> {
        match Self::resolve(external_id, name.unwrap_or_default()) {
            IdentityKey::NameFallback(name) if name.is_empty() => None,
            key => Some(key),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::ExternalId(id) => write!(f, "id={}", id),
            IdentityKey::NameFallback(name) => write!(f, "name={}", name),
        }
    }
}
