//! Seams between the connection lifecycle, its observers, and the heartbeat monitor.

use serde_json::Value;

use super::connection::Connection;
use super::error::TransportError;

/// Observer of a single connection's lifecycle.
///
/// Every method has a no-op default, implementors override what they need.
/// For one connection, `on_open` precedes every other event and `on_close`
/// fires exactly once, last.
///
/// # Example
///
/// ```ignore
/// struct Printer;
///
/// impl ConnectionEvents for Printer {
///     fn on_message(&self, _connection: &Connection, value: Value) {
///         println!("{value}");
///     }
/// }
///
/// let connection = Connection::open(WSS_HOST, Arc::new(Printer))?;
/// ```
pub trait ConnectionEvents: Send + Sync + 'static {
    /// The socket handshake completed.
    fn on_open(&self, connection: &Connection) {
        let _ = connection;
    }

    /// An inbound frame decoded into a JSON value.
    fn on_message(&self, connection: &Connection, value: Value) {
        let _ = (connection, value);
    }

    /// The transport reported an error. The connection may or may not close afterwards.
    fn on_error(&self, connection: &Connection, error: &TransportError) {
        let _ = (connection, error);
    }

    /// The connection reached its terminal state.
    fn on_close(&self, connection: &Connection) {
        let _ = connection;
    }
}

/// Something the heartbeat monitor can probe.
pub trait HeartbeatTarget: Send + Sync + 'static {
    /// Whether the underlying socket is open.
    fn is_open(&self) -> bool;

    /// Clear the liveness flag, returning its previous value.
    fn take_alive(&self) -> bool;

    /// Send a liveness probe. The acknowledgement sets the flag again.
    fn send_probe(&self);

    /// Drop the socket without a closing handshake.
    fn force_close(&self);
}
