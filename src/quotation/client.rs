use std::sync::Arc;

use super::subscription::{SubscribeOptions, SubscriptionEvents};
use crate::Result;
use crate::WSS_HOST;
use crate::ws::config::Config;
use crate::ws::{Connection, Registry};

/// Realtime quotation client.
///
/// Every subscription opens its own connection to the client's endpoint.
/// Open connections are tracked in a [`Registry`] shared by all clones of
/// this client (and by any other client built with the same registry),
/// which runs a single heartbeat monitor for all of them.
///
/// # Examples
///
/// ```rust, no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use serde_json::Value;
/// use upbit_client_sdk::quotation::{Client, SubscribeOptions};
/// use upbit_client_sdk::ws::TopicMap;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = Client::default();
///
///     let options = SubscribeOptions::builder()
///         .subscription_list(TopicMap::from([(
///             "trade".to_owned(),
///             vec!["KRW-BTC".to_owned()],
///         )]))
///         .message_callback(Arc::new(|value: Value| println!("{value}")))
///         .build();
///     let _connection = client.subscribe(options)?;
///
///     tokio::time::sleep(Duration::from_secs(60)).await;
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    /// Realtime endpoint
    endpoint: String,
    /// Open connections and their heartbeat monitor
    registry: Arc<Registry>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(WSS_HOST, &Config::default())
    }
}

impl Client {
    /// Create a client with its own registry.
    #[must_use]
    pub fn new(endpoint: &str, config: &Config) -> Self {
        Self::with_registry(endpoint, Arc::new(Registry::new(config)))
    }

    /// Create a client sharing `registry` with other clients.
    #[must_use]
    pub fn with_registry(endpoint: &str, registry: Arc<Registry>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                endpoint: endpoint.to_owned(),
                registry,
            }),
        }
    }

    /// Open a connection and subscribe to `options.subscription_list` once it is open.
    ///
    /// Returns immediately. The connection is registered when it opens, so it
    /// may not be visible in [`Client::registry`] right after this call.
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self, options: SubscribeOptions) -> Result<Connection> {
        let events = SubscriptionEvents::new(options, Arc::clone(&self.inner.registry));
        Connection::open(&self.inner.endpoint, Arc::new(events))
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Stop the heartbeat monitor and forget every registered connection.
    ///
    /// Connections stay open until closed by the caller or the peer.
    pub fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(connections = self.inner.registry.len(), "Shutting down quotation client");

        self.inner.registry.shutdown();
    }
}
