//! Opaque identifiers for decks, matches and versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An opaque entity ID.
///
/// New entities get a random UUID v4, but any string read from storage is
/// accepted as-is: older records may carry IDs in another format.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an existing ID string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate a fresh random ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Type alias for deck IDs
pub type DeckId = EntityId;

/// Type alias for match IDs
pub type MatchId = EntityId;

/// Type alias for deck version IDs
pub type VersionId = EntityId;
