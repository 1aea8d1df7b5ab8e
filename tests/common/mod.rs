#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]
#![allow(
    unused,
    reason = "Not every test binary uses every helper"
)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt as _, StreamExt as _};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

/// Mock realtime server.
pub struct MockWsServer {
    addr: SocketAddr,
    /// Broadcast frames to ALL connected clients
    message_tx: broadcast::Sender<Message>,
    /// Receives text frames sent by clients
    frame_rx: mpsc::UnboundedReceiver<String>,
}

impl MockWsServer {
    /// Start a server on a random port that answers PINGs.
    pub async fn start() -> Self {
        Self::spawn(true, None).await
    }

    /// Start a server that writes `greeting` to every client right after the handshake.
    pub async fn start_with_greeting(greeting: &str) -> Self {
        Self::spawn(true, Some(greeting.to_owned())).await
    }

    /// Start a server that completes the handshake and then never reads, so
    /// PINGs go unanswered.
    pub async fn start_silent() -> Self {
        Self::spawn(false, None).await
    }

    async fn spawn(responsive: bool, greeting: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (message_tx, _) = broadcast::channel::<Message>(100);
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();

        let broadcast_tx = message_tx.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };

                // Subscribe before the handshake completes so nothing sent
                // after the client sees the open is lost
                let mut msg_rx = broadcast_tx.subscribe();
                let frame_tx = frame_tx.clone();
                let greeting = greeting.clone();

                let Ok(ws_stream) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };

                if !responsive {
                    tokio::spawn(async move {
                        let _held = ws_stream;
                        std::future::pending::<()>().await;
                    });
                    continue;
                }

                let (mut write, mut read) = ws_stream.split();

                tokio::spawn(async move {
                    if let Some(greeting) = greeting
                        && write.send(Message::Text(greeting.into())).await.is_err()
                    {
                        return;
                    }

                    loop {
                        tokio::select! {
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Text(text))) => {
                                        drop(frame_tx.send(text.to_string()));
                                    }
                                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                    // PONG replies are flushed by tungstenite on the next read
                                    Some(Ok(_)) => {}
                                }
                            }
                            msg = msg_rx.recv() => {
                                match msg {
                                    Ok(Message::Close(frame)) => {
                                        drop(write.send(Message::Close(frame)).await);
                                        break;
                                    }
                                    Ok(message) => {
                                        if write.send(message).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(_) => break,
                                }
                            }
                        }
                    }
                });
            }
        });

        Self {
            addr,
            message_tx,
            frame_rx,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send a text frame to all connected clients.
    pub fn send_text(&self, text: &str) {
        drop(self.message_tx.send(Message::Text(text.into())));
    }

    /// Send a binary frame to all connected clients.
    pub fn send_binary(&self, payload: &str) {
        drop(
            self.message_tx
                .send(Message::Binary(payload.as_bytes().to_vec().into())),
        );
    }

    /// Close every connected client.
    pub fn close_all(&self) {
        drop(self.message_tx.send(Message::Close(None)));
    }

    /// Receive the next text frame sent by a client.
    pub async fn recv_frame(&mut self) -> Option<String> {
        timeout(Duration::from_secs(2), self.frame_rx.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn try_recv_frame(&mut self) -> Option<String> {
        self.frame_rx.try_recv().ok()
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    timeout(Duration::from_secs(2), async {
        while !condition() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met within two seconds");
}
