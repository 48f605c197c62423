//! Local session: who we are and what we last scored.
//!
//! The session store is a JSON document written by the account front-end
//! (`{"id": .., "username": .., "score": .., "isBlocked": ..}`). It is read once
//! at startup; without it there is nobody to play as.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::util::id::PlayerId;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("no session found at {0}")]
    Missing(PathBuf),
    #[error("failed to read session {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed session: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("account {0} is blocked")]
    Blocked(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: PlayerId,
    pub username: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub is_blocked: bool,
}

impl Session {
    pub fn new(id: impl Into<String>, username: impl Into<String>, score: i64) -> Self {
        Self { id: PlayerId::new(id), username: username.into(), score, is_blocked: false }
    }

    /// Parses a session document. A blocked account is rejected here so that no
    /// connection is ever attempted on its behalf.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let session: Session = serde_json::from_str(raw)?;
        if session.is_blocked {
            return Err(SessionError::Blocked(session.username));
        }
        Ok(session)
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::Missing(path.to_path_buf()));
            }
            Err(source) => {
                return Err(SessionError::Unreadable { path: path.to_path_buf(), source });
            }
        };
        let session = Self::parse(&raw)?;
        tracing::info!(id = %session.id, username = %session.username, "session loaded");
        Ok(session)
    }
}
