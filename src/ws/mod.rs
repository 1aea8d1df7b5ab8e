//! Core WebSocket infrastructure.
//!
//! # Architecture
//!
//! - [`Connection`]: one socket session, reporting lifecycle events to a [`ConnectionEvents`]
//! - [`Registry`]: shared map of open connections owning the heartbeat monitor
//! - [`heartbeat`]: two-tick dead peer detection driven by the registry
//! - [`frame`]: subscription frame encoding and inbound frame decoding
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(Registry::default());
//! let connection = Connection::open(WSS_HOST, Arc::new(MyEvents { registry }))?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod heartbeat;
pub mod registry;
#[cfg(test)]
pub(crate) mod testing;
pub mod traits;

pub use connection::{Connection, ConnectionState};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use error::TransportError;
pub use frame::{DecodeError, SubscriptionFrame, TopicMap, UNIQUE_TICKET};
pub use registry::Registry;
pub use traits::*;
