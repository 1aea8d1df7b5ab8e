#![expect(
    clippy::module_name_repetitions,
    reason = "Re-exported names intentionally match their modules for API clarity"
)]

//! Realtime quotation subscriptions.
//!
//! [`Client::subscribe`] opens a connection to the realtime endpoint, sends
//! the subscription frame for the requested topics once it is open, and
//! forwards every decoded message to the caller's callback. Connections are
//! kept alive by the heartbeat monitor of the client's [`Registry`](crate::ws::Registry).
//!
//! # Available Topics
//!
//! - **ticker**: current price
//! - **trade**: executed trades
//! - **orderbook**: order book snapshots
//!
//! # Reconnecting
//!
//! A closed subscription is never re-opened by the client. Supply a
//! `reconnect` hook and call [`Client::subscribe`] again from it, waiting as
//! long as a [`ReconnectPolicy`](crate::ws::config::ReconnectPolicy) suggests.

pub mod client;
pub mod subscription;

pub use client::Client;
pub use subscription::{
    ErrorCallback, MessageCallback, OpenCallback, ReconnectHook, SubscribeOptions, TopicType,
};
