//! Configuration utilities (server endpoint, transports, session path, env vars).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::net::connection::ConnectionConfig;
use crate::net::transport::{TransportKind, UnknownTransport};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_SESSION_FILE: &str = "session.json";
const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid server url {url:?}: {reason}")]
    ServerUrl { url: String, reason: String },
    #[error(transparent)]
    Transport(#[from] UnknownTransport),
    #[error("no transport configured")]
    NoTransport,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub session_file: PathBuf,
}

/// Overrides taken from the command line; `None` falls back to the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub transports: Option<String>,
    pub reconnect_delay_ms: Option<u64>,
    pub session_file: Option<PathBuf>,
}

impl Config {
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        let url = overrides.server_url.unwrap_or_else(server_url);
        let endpoint = Url::parse(&url)
            .map_err(|err| ConfigError::ServerUrl { reason: err.to_string(), url })?;

        let transports = match overrides.transports.or_else(|| env::var("MEMORIA_TRANSPORTS").ok()) {
            Some(list) => parse_transports(&list)?,
            None => vec![TransportKind::WebSocket, TransportKind::Polling],
        };

        let mut connection = ConnectionConfig::new(endpoint);
        connection.transports = transports;
        connection.reconnect_delay = overrides
            .reconnect_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(reconnect_delay);

        Ok(Self {
            connection,
            session_file: overrides.session_file.unwrap_or_else(session_file),
        })
    }
}

/// Game server base URL.
///
/// Reads `MEMORIA_SERVER_URL`, defaults to the local development server.
pub fn server_url() -> String {
    env::var("MEMORIA_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string())
}

/// Fixed delay between reconnection attempts (`MEMORIA_RECONNECT_DELAY_MS`).
pub fn reconnect_delay() -> Duration {
    let ms = env::var("MEMORIA_RECONNECT_DELAY_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RECONNECT_DELAY_MS);
    Duration::from_millis(ms)
}

/// Where the account front-end left the session document (`MEMORIA_SESSION_FILE`).
pub fn session_file() -> PathBuf {
    env::var("MEMORIA_SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE))
}

/// Comma separated, in preference order: `websocket,polling`.
pub fn parse_transports(list: &str) -> Result<Vec<TransportKind>, ConfigError> {
    let mut kinds = Vec::new();
    for name in list.split(',').filter(|s| !s.trim().is_empty()) {
        let kind: TransportKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(ConfigError::NoTransport);
    }
    Ok(kinds)
}
