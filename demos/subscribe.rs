//! Streams KRW-BTC trades, re-subscribing with exponential backoff whenever the connection closes.
//!
//! Run with:
//! ```sh
//! RUST_LOG=debug cargo run --example subscribe --features tracing
//! ```
//!
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};
use upbit_client_sdk::DEFAULT_MARKET;
use upbit_client_sdk::quotation::{Client, SubscribeOptions, TopicType};
use upbit_client_sdk::ws::config::{ReconnectConfig, ReconnectPolicy};
use upbit_client_sdk::ws::{Connection, TopicMap, TransportError};

fn subscribe(
    client: &Client,
    policy: &Arc<ReconnectPolicy>,
) -> upbit_client_sdk::Result<Connection> {
    let on_open = Arc::clone(policy);
    let on_close = Arc::clone(policy);
    let reconnect_client = client.clone();

    let options = SubscribeOptions::builder()
        .subscription_list(TopicMap::from([(
            TopicType::Trade.to_string(),
            vec![DEFAULT_MARKET.to_owned()],
        )]))
        .open_callback(Arc::new(move |endpoint: &str| {
            info!(%endpoint, "OPENED");
            on_open.reset();
        }))
        .message_callback(Arc::new(|value: Value| info!(%value, "message")))
        .error_callback(Arc::new(|error: &TransportError| warn!(%error, "transport error")))
        .reconnect(Arc::new(move || {
            let Some(delay) = on_close.next_delay() else {
                warn!(attempts = on_close.attempts(), "giving up on reconnecting");
                return;
            };

            info!(?delay, attempt = on_close.attempts(), "RECONNECT");
            let client = reconnect_client.clone();
            let policy = Arc::clone(&on_close);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = subscribe(&client, &policy) {
                    warn!(%e, "unable to re-subscribe");
                }
            });
        }))
        .build();

    client.subscribe(options)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let policy = Arc::new(ReconnectPolicy::new(
        &ReconnectConfig::default().with_max_attempts(10),
    ));

    let client = Client::default();
    let connection = subscribe(&client, &policy)?;

    tokio::time::sleep(Duration::from_secs(60)).await;

    connection.close();
    client.shutdown();

    Ok(())
}
