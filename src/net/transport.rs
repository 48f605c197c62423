//! Frame transports: a persistent WebSocket, with HTTP long-polling as fallback.
//!
//! Both carry the same JSON text frames; the connection task does not care which
//! one it got.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::session::Session;
use crate::util::id::PlayerId;

/// Pause after a long-poll that came back empty, so a server that answers
/// immediately is not hammered.
const EMPTY_POLL_PAUSE: Duration = Duration::from_millis(250);

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("endpoint {0} cannot carry a path")]
    BadEndpoint(Url),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection closed by server")]
    Closed,
}

#[derive(thiserror::Error, Debug)]
#[error("unknown transport {0:?} (expected `websocket` or `polling`)")]
pub struct UnknownTransport(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    WebSocket,
    Polling,
}

impl FromStr for TransportKind {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(TransportKind::WebSocket),
            "polling" | "poll" => Ok(TransportKind::Polling),
            other => Err(UnknownTransport(other.to_string())),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::WebSocket => "websocket",
            TransportKind::Polling => "polling",
        })
    }
}

/// Who is connecting; sent as query parameters on the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: PlayerId,
    pub username: String,
}

impl From<&Session> for Identity {
    fn from(session: &Session) -> Self {
        Self { id: session.id.clone(), username: session.username.clone() }
    }
}

impl Identity {
    fn query(&self) -> [(&'static str, &str); 2] {
        [("playerId", self.id.as_str()), ("username", self.username.as_str())]
    }
}

/// Appends path segments to `base`, keeping whatever path it already has.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TransportError::BadEndpoint(base.clone()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `http(s)://host/base` → `ws(s)://host/base/ws?playerId=..&username=..`
pub fn websocket_url(base: &Url, identity: &Identity) -> Result<Url, TransportError> {
    let mut url = endpoint(base, &["ws"])?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme).map_err(|_| TransportError::BadEndpoint(base.clone()))?;
    url.query_pairs_mut().extend_pairs(identity.query());
    Ok(url)
}

pub enum Transport {
    WebSocket(WebSocketStream<MaybeTlsStream<TcpStream>>),
    Polling(PollingTransport),
}

impl Transport {
    pub async fn open(
        kind: TransportKind,
        base: &Url,
        identity: &Identity,
        http: &reqwest::Client,
    ) -> Result<Self, TransportError> {
        match kind {
            TransportKind::WebSocket => {
                let url = websocket_url(base, identity)?;
                let (ws, _response) = connect_async(url.as_str()).await?;
                Ok(Transport::WebSocket(ws))
            }
            TransportKind::Polling => {
                Ok(Transport::Polling(PollingTransport::open(base, identity, http.clone()).await?))
            }
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::WebSocket(_) => TransportKind::WebSocket,
            Transport::Polling(_) => TransportKind::Polling,
        }
    }

    pub async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        match self {
            Transport::WebSocket(ws) => Ok(ws.send(Message::Text(frame)).await?),
            Transport::Polling(poll) => poll.send(frame).await,
        }
    }

    /// Next inbound text frame; `Ok(None)` once the peer has closed. Cancel safe.
    pub async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        match self {
            Transport::WebSocket(ws) => loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                    Some(Ok(Message::Close(_))) | None => return Ok(None),
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Err(err.into()),
                }
            },
            Transport::Polling(poll) => poll.recv().await,
        }
    }

    pub async fn close(self) {
        match self {
            Transport::WebSocket(mut ws) => {
                if let Err(err) = ws.close(None).await {
                    tracing::debug!(%err, "websocket close");
                }
            }
            Transport::Polling(poll) => poll.close().await,
        }
    }
}

#[derive(Deserialize)]
struct PollHandshake {
    sid: String,
}

/// Long-polling session. A background task keeps one GET outstanding and
/// queues whatever frames come back, which keeps `recv` cancel safe.
pub struct PollingTransport {
    http: reqwest::Client,
    poll_url: Url,
    close_url: Url,
    inbox: mpsc::UnboundedReceiver<Result<String, TransportError>>,
    poller: JoinHandle<()>,
}

impl PollingTransport {
    async fn open(base: &Url, identity: &Identity, http: reqwest::Client) -> Result<Self, TransportError> {
        let handshake: PollHandshake = http
            .post(endpoint(base, &["poll", "open"])?)
            .query(&identity.query())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut poll_url = endpoint(base, &["poll"])?;
        poll_url.query_pairs_mut().append_pair("sid", &handshake.sid);
        let mut close_url = endpoint(base, &["poll", "close"])?;
        close_url.query_pairs_mut().append_pair("sid", &handshake.sid);

        let (tx, inbox) = mpsc::unbounded_channel();
        let poller = tokio::spawn(poll_loop(http.clone(), poll_url.clone(), tx));
        tracing::debug!(sid = %handshake.sid, "polling session opened");
        Ok(Self { http, poll_url, close_url, inbox, poller })
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.http
            .post(self.poll_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(frame)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        match self.inbox.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    async fn close(self) {
        self.poller.abort();
        let result = self.http.post(self.close_url.clone()).send().await;
        if let Err(err) = result {
            tracing::debug!(%err, "polling close");
        }
    }
}

impl Drop for PollingTransport {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

async fn poll_loop(
    http: reqwest::Client,
    url: Url,
    tx: mpsc::UnboundedSender<Result<String, TransportError>>,
) {
    loop {
        let batch = async {
            let frames: Vec<serde_json::Value> =
                http.get(url.clone()).send().await?.error_for_status()?.json().await?;
            Ok::<_, TransportError>(frames)
        }
        .await;

        match batch {
            Ok(frames) if frames.is_empty() => tokio::time::sleep(EMPTY_POLL_PAUSE).await,
            Ok(frames) => {
                for frame in frames {
                    if tx.send(Ok(frame.to_string())).is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                let _ = tx.send(Err(err));
                return;
            }
        }
    }
}
