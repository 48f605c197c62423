//! ID utilities (player ids as sent by the game server).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque player identity.
///
/// The server is not consistent about the JSON type of ids: some payloads carry
/// them as strings, others as numbers. Both normalise to the same text so that
/// equality comparisons between a snapshot and the local session hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => PlayerId(s),
            RawId::Signed(n) => PlayerId(n.to_string()),
            RawId::Unsigned(n) => PlayerId(n.to_string()),
        })
    }
}
