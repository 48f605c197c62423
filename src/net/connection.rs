//! Connection lifecycle: connect, reconnect forever, tear down.
//!
//! A [`Connection`] is a handle to a background task that owns the transport.
//! Outbound intents travel to it over an unbounded channel; inbound frames come
//! back decoded as [`InboundEvent`]s on the receiver returned by
//! [`Connection::connect`]. The task never touches game state.

use std::time::Duration;

use reqwest::Url;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::game::Outbox;
use crate::net::transport::{Identity, Transport, TransportError, TransportKind};
use crate::protocol::{InboundEvent, OutboundEvent};

/// How long [`Connection::close`] waits for the goodbye before giving up.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub endpoint: Url,
    /// Tried in order on every attempt; the first one that opens wins.
    pub transports: Vec<TransportKind>,
    /// Fixed pause between attempts. It does not grow.
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            transports: vec![TransportKind::WebSocket, TransportKind::Polling],
            reconnect_delay: Duration::from_millis(1000),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Connection {
    cmd_tx: mpsc::UnboundedSender<OutboundEvent>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Connection {
    /// Spawns the connection task. Must be called inside a tokio runtime.
    pub fn connect(
        config: ConnectionConfig,
        identity: Identity,
    ) -> (Self, mpsc::UnboundedReceiver<InboundEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(run(config, identity, cmd_rx, event_tx, shutdown.clone()));
        (Self { cmd_tx, shutdown, task: Some(task) }, event_rx)
    }

    /// Stops the connection whatever state it is in: no more inbound events,
    /// `leaveGame` if a transport is open, then the transport is closed.
    pub async fn close(mut self) {
        self.shutdown.cancel();
        let Some(task) = self.task.take() else { return };
        let abort = task.abort_handle();
        if tokio::time::timeout(CLOSE_TIMEOUT, task).await.is_err() {
            warn!("connection did not close in time, aborting");
            abort.abort();
        }
        info!("connection closed");
    }
}

impl Outbox for Connection {
    fn emit(&self, event: OutboundEvent) {
        if self.cmd_tx.send(event).is_err() {
            debug!("connection task gone, intent dropped");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

enum PumpEnd {
    Shutdown,
    Lost(TransportError),
}

async fn run(
    config: ConnectionConfig,
    identity: Identity,
    mut cmd_rx: mpsc::UnboundedReceiver<OutboundEvent>,
    event_tx: mpsc::UnboundedSender<InboundEvent>,
    shutdown: CancellationToken,
) {
    let http = reqwest::Client::new();
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        let opened = tokio::select! {
            _ = shutdown.cancelled() => return,
            opened = open_any(&config, &identity, &http) => opened,
        };

        match opened {
            Ok(mut transport) => {
                info!(transport = %transport.kind(), attempt, "connected");
                attempt = 0;
                let _ = event_tx.send(InboundEvent::Connect);

                match pump(&mut transport, &mut cmd_rx, &event_tx, &shutdown).await {
                    PumpEnd::Shutdown => {
                        say_goodbye(&mut transport, &mut cmd_rx).await;
                        transport.close().await;
                        return;
                    }
                    PumpEnd::Lost(err) => {
                        warn!(%err, "connection lost");
                        let _ = event_tx.send(InboundEvent::ConnectError(err.to_string()));
                        transport.close().await;
                    }
                }
            }
            Err(err) => {
                warn!(%err, attempt, "connect failed");
                let _ = event_tx.send(InboundEvent::ConnectError(err.to_string()));
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
}

async fn open_any(
    config: &ConnectionConfig,
    identity: &Identity,
    http: &reqwest::Client,
) -> Result<Transport, TransportError> {
    let mut last = TransportError::Closed;
    for &kind in &config.transports {
        let open = Transport::open(kind, &config.endpoint, identity, http);
        match tokio::time::timeout(config.connect_timeout, open).await {
            Ok(Ok(transport)) => return Ok(transport),
            Ok(Err(err)) => {
                debug!(transport = %kind, %err, "transport unavailable");
                last = err;
            }
            Err(_) => {
                debug!(transport = %kind, "transport timed out");
                last = TransportError::Timeout(config.connect_timeout);
            }
        }
    }
    Err(last)
}

async fn pump(
    transport: &mut Transport,
    cmd_rx: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    event_tx: &mpsc::UnboundedSender<InboundEvent>,
    shutdown: &CancellationToken,
) -> PumpEnd {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return PumpEnd::Shutdown,
            cmd = cmd_rx.recv() => {
                let Some(event) = cmd else { return PumpEnd::Shutdown };
                if let Err(err) = send_event(transport, &event).await {
                    return PumpEnd::Lost(err);
                }
            }
            frame = transport.recv() => match frame {
                Ok(Some(text)) => match InboundEvent::from_frame(&text) {
                    Ok(event) => {
                        let _ = event_tx.send(event);
                    }
                    Err(err) => debug!(%err, frame = %text, "unrecognised frame dropped"),
                },
                Ok(None) => return PumpEnd::Lost(TransportError::Closed),
                Err(err) => return PumpEnd::Lost(err),
            },
        }
    }
}

async fn send_event(transport: &mut Transport, event: &OutboundEvent) -> Result<(), TransportError> {
    let frame = event.to_frame()?;
    debug!(%frame, "emit");
    transport.send(frame).await
}

/// Flushes intents queued before teardown, then announces that we leave.
/// Best effort: errors are logged and otherwise ignored.
async fn say_goodbye(transport: &mut Transport, cmd_rx: &mut mpsc::UnboundedReceiver<OutboundEvent>) {
    cmd_rx.close();
    while let Ok(event) = cmd_rx.try_recv() {
        if event == OutboundEvent::LeaveGame {
            continue;
        }
        if let Err(err) = send_event(transport, &event).await {
            debug!(%err, "queued intent lost on teardown");
            return;
        }
    }
    if let Err(err) = send_event(transport, &OutboundEvent::LeaveGame).await {
        debug!(%err, "leaveGame not delivered");
    }
}
