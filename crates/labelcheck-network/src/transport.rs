//! Persistent websocket channel to the scanner hub.
//!
//! # Architecture
//!
//! ```text
//!  ScanOrchestrator ──send()──► command queue ──┐
//!                                               ▼
//!                                   ┌───────────────────────┐     ws://
//!                                   │ transport task        │◄──────────► scanner hub
//!                                   │  connect / reconnect  │
//!                                   └───────────────────────┘
//!                                               │
//!  TransportEvents ◄── StateChanged / Message / Malformed (arrival order)
//! ```
//!
//! The task owns the socket. Inbound text frames are parsed with
//! [`parse_frame`] and forwarded in arrival order; frames that fail to parse
//! are forwarded as [`TransportEvent::Malformed`] so the consumer can report
//! them.
//!
//! # Reconnection
//!
//! After a failed attempt or a dropped session the task waits a constant
//! interval and tries again. The attempt counter resets on every successful
//! open; once it reaches the configured budget the task stops in
//! [`ConnectionState::Closed`].
//!
//! Commands are only accepted while the channel is open. A command still
//! queued when its session ends is discarded, never replayed on the next
//! session.

use std::fmt;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use labelcheck_core::constants::{
    CONNECT_TIMEOUT_MS, DEFAULT_SCANNER_URL, EVENT_CHANNEL_CAPACITY, MAX_RECONNECT_ATTEMPTS,
    RECONNECT_INTERVAL_MS,
};
use labelcheck_protocol::{ScannerCommand, ScannerMessage, encode_command, parse_frame};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Configuration for the scanner hub connection.
///
/// # Example
///
/// ```
/// use labelcheck_network::ScannerTransportConfig;
/// use std::time::Duration;
///
/// let config = ScannerTransportConfig {
///     url: "ws://10.0.0.20:8089".to_string(),
///     reconnect_interval: Duration::from_secs(1),
///     ..Default::default()
/// };
/// assert_eq!(config.max_reconnect_attempts, 100_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerTransportConfig {
    /// Hub endpoint (`ws://` or `wss://`).
    pub url: String,

    /// Constant wait between reconnection attempts.
    pub reconnect_interval: Duration,

    /// Consecutive failed attempts tolerated before giving up.
    pub max_reconnect_attempts: u32,

    /// Timeout for one open handshake.
    pub connect_timeout: Duration,
}

impl Default for ScannerTransportConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SCANNER_URL.to_string(),
            reconnect_interval: Duration::from_millis(RECONNECT_INTERVAL_MS),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
        }
    }
}

/// Connection status of the scanner channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered by the transport, in arrival order.
#[derive(Debug)]
pub enum TransportEvent {
    /// Connection state changed.
    StateChanged(ConnectionState),

    /// Well-formed scanner message.
    Message(ScannerMessage),

    /// Inbound frame that could not be decoded. The frame is discarded.
    Malformed {
        error: labelcheck_core::Error,
        raw_len: usize,
    },
}

/// Errors returned by the transport handle.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Commands are only accepted while the channel is open.
    #[error("Scanner channel is not open (state: {0})")]
    NotOpen(ConnectionState),

    /// The connection task is no longer running.
    #[error("Scanner transport has stopped")]
    Stopped,

    /// The configured endpoint is not a websocket URL.
    #[error("Invalid scanner URL: {0}")]
    InvalidUrl(String),

    /// Command could not be encoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] labelcheck_core::Error),
}

/// Receiving side of the transport event stream.
pub type TransportEvents = mpsc::Receiver<TransportEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Status {
    state: ConnectionState,
    session: u64,
}

#[derive(Debug)]
struct Outbound {
    session: u64,
    text: String,
}

/// Entry point for the scanner hub connection.
pub struct ScannerTransport;

impl ScannerTransport {
    /// Validate `config` and start the connection task.
    ///
    /// Returns the control handle and the event stream. The task keeps
    /// running until the handle is shut down or dropped, or until the
    /// reconnect budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the URL does not parse or is
    /// not `ws`/`wss`.
    pub fn spawn(
        config: ScannerTransportConfig,
    ) -> Result<(TransportHandle, TransportEvents), TransportError> {
        let url = Url::parse(&config.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.url)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(format!(
                "{}: scheme must be ws or wss",
                config.url
            )));
        }

        let (status_tx, status_rx) = watch::channel(Status {
            state: ConnectionState::Closed,
            session: 0,
        });
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let worker = Worker {
            url,
            reconnect_interval: config.reconnect_interval,
            max_reconnect_attempts: config.max_reconnect_attempts,
            connect_timeout: config.connect_timeout,
            status_tx,
            events_tx,
            command_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());

        let handle = TransportHandle {
            status: status_rx,
            commands: command_tx,
            cancel,
            task: Some(task),
        };

        Ok((handle, events_rx))
    }
}

/// Control handle for a running transport.
pub struct TransportHandle {
    status: watch::Receiver<Status>,
    commands: mpsc::Sender<Outbound>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TransportHandle {
    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> u64 {
        self.status.borrow().session
    }

    /// Wait until the connection reaches `state`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Stopped`] if the task ends first.
    pub async fn wait_for(&self, state: ConnectionState) -> Result<(), TransportError> {
        let mut status = self.status.clone();
        status
            .wait_for(|s| s.state == state)
            .await
            .map(|_| ())
            .map_err(|_| TransportError::Stopped)
    }

    /// Queue a command for the hub.
    ///
    /// # Errors
    ///
    /// - [`TransportError::NotOpen`] unless the channel is open
    /// - [`TransportError::Protocol`] if the command cannot be encoded
    /// - [`TransportError::Stopped`] if the connection task has ended
    pub async fn send(&self, command: ScannerCommand) -> Result<(), TransportError> {
        let status = *self.status.borrow();
        if status.state != ConnectionState::Open {
            debug!(
                state = %status.state,
                command = %command.command_type,
                "Command rejected, channel not open"
            );
            return Err(TransportError::NotOpen(status.state));
        }

        let text = encode_command(&command)?;
        trace!(session = status.session, command = %command.command_type, "Queueing command");

        self.commands
            .send(Outbound {
                session: status.session,
                text,
            })
            .await
            .map_err(|_| TransportError::Stopped)
    }

    /// Close the channel and wait for the connection task to finish.
    pub async fn shutdown(mut self) -> Result<(), TransportError> {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.await.map_err(|e| {
            error!(error = %e, "Scanner transport task failed");
            TransportError::Stopped
        })
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Why a session ended.
enum SessionEnd {
    /// Shutdown requested or nobody is listening any more.
    Stop,

    /// Socket dropped or closed by the peer.
    Lost(String),
}

struct Worker {
    url: Url,
    reconnect_interval: Duration,
    max_reconnect_attempts: u32,
    connect_timeout: Duration,
    status_tx: watch::Sender<Status>,
    events_tx: mpsc::Sender<TransportEvent>,
    command_rx: mpsc::Receiver<Outbound>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        let mut attempts: u32 = 0;
        let mut session: u64 = 0;

        loop {
            if !self.publish(ConnectionState::Connecting, session).await {
                break;
            }

            debug!(url = %self.url, attempt = attempts, "Connecting to scanner hub");
            let connect = tokio::time::timeout(
                self.connect_timeout,
                tokio_tungstenite::connect_async(self.url.as_str()),
            );
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => break,
                outcome = connect => outcome,
            };

            match outcome {
                Ok(Ok((socket, _response))) => {
                    attempts = 0;
                    session += 1;
                    if !self.publish(ConnectionState::Open, session).await {
                        break;
                    }
                    info!(url = %self.url, session, "Scanner channel open");

                    let end = self.run_session(socket, session).await;
                    self.discard_queued(session);

                    match end {
                        SessionEnd::Stop => break,
                        SessionEnd::Lost(reason) => {
                            warn!(session, reason = %reason, "Scanner channel lost");
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(url = %self.url, error = %e, "Scanner connection failed");
                }
                Err(_) => {
                    warn!(
                        url = %self.url,
                        timeout_ms = self.connect_timeout.as_millis() as u64,
                        "Scanner connection timeout"
                    );
                }
            }

            if !self.publish(ConnectionState::Closed, session).await {
                break;
            }

            if attempts >= self.max_reconnect_attempts {
                error!(
                    attempts,
                    max = self.max_reconnect_attempts,
                    "Scanner reconnect budget exhausted, giving up"
                );
                break;
            }
            attempts += 1;

            debug!(
                attempt = attempts,
                interval_ms = self.reconnect_interval.as_millis() as u64,
                "Scheduling scanner reconnect"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_interval) => {}
            }
        }

        self.discard_queued(session);
        let _ = self.publish(ConnectionState::Closed, session).await;
        debug!("Scanner transport stopped");
    }

    /// Publish a state change. Returns `false` once nothing observes the
    /// transport any more.
    async fn publish(&self, state: ConnectionState, session: u64) -> bool {
        let previous = self.status_tx.send_replace(Status { state, session });
        if previous.state == state {
            return true;
        }

        trace!(from = %previous.state, to = %state, "Scanner channel state");
        let delivered = self
            .events_tx
            .send(TransportEvent::StateChanged(state))
            .await
            .is_ok();

        delivered || !self.status_tx.is_closed()
    }

    async fn run_session<S>(&mut self, socket: WebSocketStream<S>, session: u64) -> SessionEnd
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut sink, mut stream) = socket.split();

        let end = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break SessionEnd::Stop,

                command = self.command_rx.recv() => match command {
                    Some(Outbound { session: tagged, text }) if tagged == session => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            break SessionEnd::Lost(e.to_string());
                        }
                    }
                    Some(Outbound { session: tagged, .. }) => {
                        debug!(session, tagged, "Dropping command from previous session");
                    }
                    None => break SessionEnd::Stop,
                },

                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !self.deliver(&text).await {
                            break SessionEnd::Stop;
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let text = String::from_utf8_lossy(&bytes);
                        if !self.deliver(&text).await {
                            break SessionEnd::Stop;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("closed by hub: {} {}", f.code, f.reason))
                            .unwrap_or_else(|| "closed by hub".to_string());
                        break SessionEnd::Lost(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break SessionEnd::Lost(e.to_string()),
                    None => break SessionEnd::Lost("stream ended".to_string()),
                },
            }
        };

        if matches!(end, SessionEnd::Stop) {
            let _ = self.publish(ConnectionState::Closing, session).await;
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!(error = %e, "Close frame not sent");
            }
        }

        end
    }

    /// Parse and forward one inbound frame. Returns `false` if the event
    /// stream is gone.
    async fn deliver(&self, text: &str) -> bool {
        let event = match parse_frame(text) {
            Ok(message) => {
                trace!(
                    message_type = %message.message_type(),
                    scanner_id = ?message.scanner_id(),
                    "Scanner message received"
                );
                TransportEvent::Message(message)
            }
            Err(error) => {
                warn!(error = %error, raw_len = text.len(), "Malformed scanner frame discarded");
                TransportEvent::Malformed {
                    error,
                    raw_len: text.len(),
                }
            }
        };

        self.events_tx.send(event).await.is_ok()
    }

    fn discard_queued(&mut self, session: u64) {
        let mut dropped = 0usize;
        while self.command_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(session, dropped, "Discarded commands queued for a closed session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_config_default() {
        let config = ScannerTransportConfig::default();
        assert_eq!(config.url, DEFAULT_SCANNER_URL);
        assert_eq!(config.reconnect_interval, Duration::from_secs(3));
        assert_eq!(config.max_reconnect_attempts, 100_000);
    }

    #[rstest]
    #[case(ConnectionState::Connecting, "connecting")]
    #[case(ConnectionState::Open, "open")]
    #[case(ConnectionState::Closing, "closing")]
    #[case(ConnectionState::Closed, "closed")]
    fn test_connection_state_display(#[case] state: ConnectionState, #[case] expected: &str) {
        assert_eq!(state.to_string(), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("http://127.0.0.1:8089")]
    #[tokio::test]
    async fn test_spawn_rejects_non_websocket_url(#[case] url: &str) {
        let config = ScannerTransportConfig {
            url: url.to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ScannerTransport::spawn(config),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
