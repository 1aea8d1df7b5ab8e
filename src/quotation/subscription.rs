use std::sync::Arc;

use bon::Builder;
use serde_json::Value;

use crate::ws::frame;
use crate::ws::{Connection, ConnectionEvents, Registry, TopicMap, TransportError};

/// Invoked with no arguments when a subscription's connection closes.
pub type ReconnectHook = Arc<dyn Fn() + Send + Sync>;
/// Invoked with the endpoint once the connection is open.
pub type OpenCallback = Arc<dyn Fn(&str) + Send + Sync>;
/// Invoked with every decoded inbound message.
pub type MessageCallback = Arc<dyn Fn(Value) + Send + Sync>;
/// Invoked with every transport error.
pub type ErrorCallback = Arc<dyn Fn(&TransportError) + Send + Sync>;

/// Topic types served by the realtime endpoint.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TopicType {
    /// Current price
    Ticker,
    /// Executed trades
    Trade,
    /// Order book snapshots
    Orderbook,
}

/// Options for [`Client::subscribe`](super::Client::subscribe).
///
/// # Example
///
/// ```rust, no_run
/// use std::sync::Arc;
///
/// use serde_json::Value;
/// use upbit_client_sdk::quotation::{SubscribeOptions, TopicType};
/// use upbit_client_sdk::ws::TopicMap;
///
/// let options = SubscribeOptions::builder()
///     .subscription_list(TopicMap::from([(
///         TopicType::Trade.to_string(),
///         vec!["KRW-BTC".to_owned()],
///     )]))
///     .message_callback(Arc::new(|value: Value| println!("{value}")))
///     .build();
/// ```
#[non_exhaustive]
#[derive(Clone, Builder)]
pub struct SubscribeOptions {
    /// Called after the connection closes, for any reason. The core never
    /// reconnects by itself, opening a new subscription is up to this hook.
    pub reconnect: Option<ReconnectHook>,
    pub open_callback: Option<OpenCallback>,
    pub message_callback: Option<MessageCallback>,
    pub error_callback: Option<ErrorCallback>,
    /// Topics requested by the frame sent on open
    pub subscription_list: TopicMap,
}

/// Wires one subscription's options to its connection and the shared registry.
pub(crate) struct SubscriptionEvents {
    options: SubscribeOptions,
    registry: Arc<Registry>,
}

impl SubscriptionEvents {
    pub(crate) fn new(options: SubscribeOptions, registry: Arc<Registry>) -> Self {
        Self { options, registry }
    }
}

impl ConnectionEvents for SubscriptionEvents {
    fn on_open(&self, connection: &Connection) {
        if let Some(open_callback) = &self.options.open_callback {
            open_callback(connection.endpoint());
        }

        match frame::encode_subscription(&self.options.subscription_list) {
            Ok(request) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(endpoint = %connection.endpoint(), %request, "Sending subscription frame");

                if let Err(e) = connection.send_text(request) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%e, "Failed to send subscription frame");
                    #[cfg(not(feature = "tracing"))]
                    let _: &crate::error::Error = &e;
                }
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%e, "Failed to encode subscription frame");
                #[cfg(not(feature = "tracing"))]
                let _: &crate::error::Error = &e;
            }
        }

        self.registry.register(connection.endpoint(), connection.clone());
    }

    fn on_message(&self, _connection: &Connection, value: Value) {
        if let Some(message_callback) = &self.options.message_callback {
            message_callback(value);
        }
    }

    fn on_error(&self, _connection: &Connection, error: &TransportError) {
        if let Some(error_callback) = &self.options.error_callback {
            error_callback(error);
        }
    }

    fn on_close(&self, connection: &Connection) {
        self.registry.unregister_exact(connection.endpoint(), connection);

        if let Some(reconnect) = &self.options.reconnect {
            #[cfg(feature = "tracing")]
            tracing::debug!(endpoint = %connection.endpoint(), "Invoking reconnect hook");

            reconnect();
        }
    }
}
