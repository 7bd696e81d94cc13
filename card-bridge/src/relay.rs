//! Event relay channel
//!
//! ```text
//! CardBridge ──publish──▶ RelayHub (broadcast, cap 256)
//!                              │
//!                              ├──▶ WS session ──▶ attendance page
//!                              └──▶ WS session ──▶ intake form
//! ```
//!
//! Fire-and-forget fan-out: no topics, no persistence, no acknowledgements.
//! A subscriber that falls behind loses the frames it missed. Connections
//! are not authenticated; the relay is meant for the front-desk LAN.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use shared::relay::{CardTap, RelayMessage};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Frames buffered per subscriber before it starts lagging
const BROADCAST_CAPACITY: usize = 256;

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Single broadcast channel of relay messages
#[derive(Clone)]
pub struct RelayHub {
    tx: broadcast::Sender<RelayMessage>,
    subscribers: Arc<AtomicUsize>,
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Send to every current subscriber; returns how many received it.
    /// Zero subscribers is not an error.
    pub fn publish(&self, msg: RelayMessage) -> usize {
        self.tx.send(msg).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayMessage> {
        self.tx.subscribe()
    }

    /// Open WebSocket sessions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Relaxed)
    }
}

/// Decrements the session counter when a session ends, however it ends
struct SessionGuard(Arc<AtomicUsize>);

impl SessionGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter.clone())
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Clone)]
struct RelayState {
    hub: RelayHub,
    shutdown: CancellationToken,
}

/// `/` upgrades to the relay WebSocket; `/health` reports subscribers
pub fn router(hub: RelayHub, shutdown: CancellationToken) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health))
        .with_state(RelayState { hub, shutdown })
}

async fn health(State(state): State<RelayState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "subscribers": state.hub.subscriber_count(),
    }))
}

async fn ws_handler(State(state): State<RelayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_session(socket, state))
}

async fn relay_session(socket: WebSocket, state: RelayState) {
    let (mut sink, mut stream) = socket.split();
    let mut hub_rx = state.hub.subscribe();
    let guard = SessionGuard::enter(&state.hub.subscribers);

    tracing::info!(subscribers = state.hub.subscriber_count(), "Relay subscriber connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }

            event = hub_rx.recv() => {
                match event {
                    Ok(msg) => {
                        let text = match msg.to_json() {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!("Failed to encode relay message: {e}");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "Relay subscriber lagged, frames dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    // subscribers have nothing to say
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    drop(guard);
    tracing::info!(subscribers = state.hub.subscriber_count(), "Relay subscriber disconnected");
}

/// Subscriber-side decoding: unknown or invalid frames are dropped, never
/// half-parsed
pub fn decode_frame(text: &str) -> Option<CardTap> {
    match RelayMessage::decode(text) {
        Ok(RelayMessage::CardTap(tap)) => Some(tap),
        Err(e) => {
            tracing::debug!("Dropping relay frame: {e}");
            None
        }
    }
}

/// Relay WebSocket server running on its own task
pub struct RelayServer {
    local_addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl RelayServer {
    /// Bind and start serving; stops when `shutdown` is cancelled
    pub async fn bind(
        addr: SocketAddr,
        hub: RelayHub,
        shutdown: CancellationToken,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Relay listening on ws://{local_addr}");

        let app = router(hub, shutdown.clone());
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await;
            if let Err(e) = result {
                tracing::error!("Relay server error: {e}");
            }
        });

        Ok(Self { local_addr, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the server task after shutdown was requested
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!("Relay task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::relay::CardUid;

    #[test]
    fn publish_without_subscribers_is_fine() {
        let hub = RelayHub::new();
        assert_eq!(hub.publish(RelayMessage::card_tap(CardUid::new("abcd").unwrap())), 0);
    }

    #[tokio::test]
    async fn every_subscriber_gets_each_message() {
        let hub = RelayHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        let msg = RelayMessage::card_tap(CardUid::new("abcd").unwrap());
        assert_eq!(hub.publish(msg.clone()), 2);
        assert_eq!(a.recv().await.unwrap(), msg);
        assert_eq!(b.recv().await.unwrap(), msg);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_lost_frames() {
        let hub = RelayHub::new();
        let mut rx = hub.subscribe();
        for i in 0..(BROADCAST_CAPACITY + 10) {
            hub.publish(RelayMessage::card_tap(CardUid::new(&format!("{i:04x}")).unwrap()));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(10))
        ));
        // continues with the oldest retained frame
        let RelayMessage::CardTap(tap) = rx.recv().await.unwrap();
        assert_eq!(tap.uid.as_str(), "000A");
    }

    #[test]
    fn decode_frame_drops_unknown_shapes() {
        let tap = decode_frame(r#"{"kind":"card_tap","version":1,"uid":"04a2b3c4"}"#).unwrap();
        assert_eq!(tap.uid.as_str(), "04A2B3C4");
        assert!(decode_frame(r#"{"uid":"04a2b3c4"}"#).is_none());
        assert!(decode_frame("ping").is_none());
    }

    #[test]
    fn session_guard_tracks_count() {
        let hub = RelayHub::new();
        let guard = SessionGuard::enter(&hub.subscribers);
        assert_eq!(hub.subscriber_count(), 1);
        drop(guard);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
