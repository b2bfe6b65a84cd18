use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Namespace reserved for client-minted identifiers. The platform API never
/// issues ids under this prefix, so classification is a pure prefix check.
pub const LOCAL_PREFIX: &str = "local-";

/// Identifier of a test-case record.
///
/// A `Local` id is minted client-side for a record that has not been
/// persisted yet; it is never sent to the server as a real id. A `Remote`
/// id is the opaque string the platform API assigned on creation. An id
/// never changes kind in place: persisting a local record replaces it with
/// the server's record under a fresh remote id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaseId {
    Local(String),
    Remote(String),
}

impl CaseId {
    /// Mint a fresh local id, distinct from every other id in this process.
    pub fn mint_local() -> Self {
        CaseId::Local(format!("{}{}", LOCAL_PREFIX, Uuid::new_v4()))
    }

    /// Classify a wire string by its namespace.
    pub fn classify(s: &str) -> Self {
        if s.starts_with(LOCAL_PREFIX) {
            CaseId::Local(s.to_string())
        } else {
            CaseId::Remote(s.to_string())
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, CaseId::Local(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            CaseId::Local(s) | CaseId::Remote(s) => s,
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CaseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(CaseId::classify(&s))
    }
}
