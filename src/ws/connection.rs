#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::stream::SplitSink;
use futures::{SinkExt as _, StreamExt as _};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;
use uuid::Uuid;

use super::error::{TransportError, WsError};
use super::frame;
use super::traits::{ConnectionEvents, HeartbeatTarget};
use crate::Result;
use crate::error::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Connection state tracking.
///
/// `Connecting → Open → Closed`, or `Connecting → Closed` when the handshake
/// fails or the attempt is abandoned. `Closed` is terminal.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,
    /// Socket open
    Open {
        /// When the connection was established
        since: Instant,
    },
    /// Terminal state
    Closed,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open { .. })
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Debug)]
enum Command {
    Send(String),
    Ping,
    Close,
    Terminate,
}

#[derive(Debug)]
struct Shared {
    id: Uuid,
    endpoint: String,
    /// Proof of life since the last heartbeat tick
    alive: AtomicBool,
    state_tx: watch::Sender<ConnectionState>,
}

/// Handle to one realtime socket session.
///
/// Clones share the same session. The socket is driven by a background task
/// that reports every lifecycle event to the [`ConnectionEvents`] passed to
/// [`Connection::open`]. Dropping the handles does not close the socket, use
/// [`Connection::close`] or [`Connection::terminate`].
#[derive(Debug, Clone)]
pub struct Connection {
    shared: Arc<Shared>,
    command_tx: mpsc::UnboundedSender<Command>,
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Connection {}

impl Connection {
    /// Start connecting to `endpoint` and return immediately.
    ///
    /// Must be called from within a tokio runtime. Fails with a validation
    /// error only when `endpoint` is not a `ws://` or `wss://` URL, every
    /// network failure is reported through `events` instead.
    pub fn open(endpoint: &str, events: Arc<dyn ConnectionEvents>) -> Result<Self> {
        let url = Url::parse(endpoint)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::validation(format!(
                "endpoint must use ws:// or wss://, got {endpoint}"
            )));
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);

        let connection = Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                endpoint: endpoint.to_owned(),
                alive: AtomicBool::new(true),
                state_tx,
            }),
            command_tx,
        };

        let task_connection = connection.clone();
        tokio::spawn(async move {
            task_connection.run(command_rx, events).await;
        });

        Ok(connection)
    }

    async fn run(
        self,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
        events: Arc<dyn ConnectionEvents>,
    ) {
        if let Some((ws_stream, pending)) = self.connect(&mut command_rx, events.as_ref()).await {
            self.handle_connection(ws_stream, pending, &mut command_rx, events.as_ref())
                .await;
        }

        self.shared.state_tx.send_replace(ConnectionState::Closed);

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoint = %self.endpoint(), id = %self.id(), "WebSocket connection closed");

        events.on_close(&self);
    }

    /// Drive the handshake, collecting text queued before the socket opened.
    ///
    /// Returns `None` when the handshake fails or the caller closes the
    /// connection before it opens.
    async fn connect(
        &self,
        command_rx: &mut mpsc::UnboundedReceiver<Command>,
        events: &dyn ConnectionEvents,
    ) -> Option<(WsStream, Vec<String>)> {
        let mut pending = Vec::new();
        let connecting = connect_async(self.shared.endpoint.as_str());
        tokio::pin!(connecting);

        loop {
            tokio::select! {
                result = &mut connecting => {
                    return match result {
                        Ok((ws_stream, _)) => Some((ws_stream, pending)),
                        Err(e) => {
                            self.report_error(events, &e);
                            None
                        }
                    };
                }
                command = command_rx.recv() => match command {
                    Some(Command::Send(text)) => pending.push(text),
                    Some(Command::Ping) => {}
                    Some(Command::Close | Command::Terminate) | None => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(endpoint = %self.endpoint(), "Connection abandoned before open");
                        return None;
                    }
                }
            }
        }
    }

    /// Handle an open WebSocket connection until it closes.
    ///
    /// Whatever `on_open` queues is written first, then text queued while
    /// connecting, so the subscription frame always leads.
    async fn handle_connection(
        &self,
        ws_stream: WsStream,
        pending: Vec<String>,
        command_rx: &mut mpsc::UnboundedReceiver<Command>,
        events: &dyn ConnectionEvents,
    ) {
        let (mut write, mut read) = ws_stream.split();

        self.shared.alive.store(true, Ordering::SeqCst);
        self.shared.state_tx.send_replace(ConnectionState::Open {
            since: Instant::now(),
        });

        let mut backlog: Vec<Command> = pending.into_iter().map(Command::Send).collect();
        backlog.extend(drain(command_rx));

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoint = %self.endpoint(), id = %self.id(), "WebSocket connection opened");

        events.on_open(self);

        for command in drain(command_rx).into_iter().chain(backlog) {
            if !self.execute(&mut write, Some(command), events).await {
                return;
            }
        }

        loop {
            tokio::select! {
                // Outgoing frames first, so that whatever is queued is written
                // before any inbound frame is dispatched
                biased;

                command = command_rx.recv() => {
                    if !self.execute(&mut write, command, events).await {
                        break;
                    }
                }

                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => self.dispatch(text.as_bytes(), events),
                    Some(Ok(Message::Binary(bytes))) => self.dispatch(&bytes, events),
                    Some(Ok(Message::Pong(_))) => {
                        self.shared.alive.store(true, Ordering::SeqCst);
                    }
                    Some(Ok(Message::Close(close_frame))) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(endpoint = %self.endpoint(), ?close_frame, "Server closed WebSocket connection");
                        #[cfg(not(feature = "tracing"))]
                        let _ = &close_frame;
                        break;
                    }
                    Some(Ok(_)) => {
                        // PING replies are queued by tungstenite itself
                    }
                    Some(Err(e)) => {
                        self.report_error(events, &e);
                        break;
                    }
                    None => break,
                },
            }
        }
    }

    /// Carry out one command on the open socket. Returns `false` once the session is over.
    async fn execute(
        &self,
        write: &mut WsSink,
        command: Option<Command>,
        events: &dyn ConnectionEvents,
    ) -> bool {
        let message = match command {
            Some(Command::Send(text)) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(%text, "Sending WebSocket text message");

                Message::Text(text.into())
            }
            Some(Command::Ping) => Message::Ping(Vec::new().into()),
            Some(Command::Close) => {
                // Terminal for the caller, the peer's reply is not awaited
                drop(write.send(Message::Close(None)).await);
                return false;
            }
            Some(Command::Terminate) | None => return false,
        };

        if let Err(e) = write.send(message).await {
            self.report_error(events, &e);
            return false;
        }

        true
    }

    /// Decode an inbound data frame and hand it to the message observer.
    ///
    /// A malformed frame is logged and dropped, the connection stays open.
    fn dispatch(&self, raw: &[u8], events: &dyn ConnectionEvents) {
        match frame::decode(raw) {
            Ok(value) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(?value, "Decoded WebSocket message");
                events.on_message(self, value);
            }
            Err(e) => {
                let error = WsError::Decode(e);
                #[cfg(feature = "tracing")]
                tracing::warn!(endpoint = %self.endpoint(), %error, "Failed to decode WebSocket message");
                #[cfg(not(feature = "tracing"))]
                let _ = &error;
            }
        }
    }

    fn report_error(&self, events: &dyn ConnectionEvents, e: &tungstenite::Error) {
        let error = TransportError::from(e);

        #[cfg(feature = "tracing")]
        tracing::warn!(endpoint = %self.endpoint(), %error, "WebSocket error");

        events.on_error(self, &error);
    }

    /// Endpoint URL, also the key this connection is registered under.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.shared.endpoint
    }

    /// Identifier unique to this session.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Whether the peer proved liveness since the last heartbeat tick.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    /// Queue a text frame. Text queued while connecting is written right after open.
    pub fn send_text<S: Into<String>>(&self, text: S) -> Result<()> {
        if self.state().is_closed() {
            return Err(WsError::ConnectionClosed.into());
        }

        self.command_tx
            .send(Command::Send(text.into()))
            .map_err(|_e| WsError::ConnectionClosed)?;
        Ok(())
    }

    /// Serialize `request` to JSON and queue it as a text frame.
    pub fn send<R: Serialize>(&self, request: &R) -> Result<()> {
        let json = serde_json::to_string(request)?;
        self.send_text(json)
    }

    /// Send a PING. Ignored unless the connection is open.
    pub fn ping(&self) {
        self.command(Command::Ping);
    }

    /// Send a close frame and end the session without awaiting the peer.
    pub fn close(&self) {
        self.command(Command::Close);
    }

    /// Drop the socket without a closing handshake.
    pub fn terminate(&self) {
        self.command(Command::Terminate);
    }

    fn command(&self, command: Command) {
        // The task is gone once the connection is closed, nothing left to do
        drop(self.command_tx.send(command));
    }
}

fn drain(command_rx: &mut mpsc::UnboundedReceiver<Command>) -> Vec<Command> {
    std::iter::from_fn(|| command_rx.try_recv().ok()).collect()
}

impl HeartbeatTarget for Connection {
    fn is_open(&self) -> bool {
        self.state().is_open()
    }

    fn take_alive(&self) -> bool {
        self.shared.alive.swap(false, Ordering::SeqCst)
    }

    fn send_probe(&self) {
        self.ping();
    }

    fn force_close(&self) {
        self.terminate();
    }
}
