//! Real-time gateway
//!
//! `GET /socket` upgrades to a WebSocket and keeps it open until the client
//! leaves. Only presence is tracked: a live connection count, plus a log
//! line on connect and on disconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use platform::client::ClientInfo;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Presence {
    connections: Arc<AtomicUsize>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ConnectionGuard {
        let live = self.connections.fetch_add(1, Ordering::SeqCst) + 1;
        ConnectionGuard {
            presence: self.clone(),
            id: Uuid::new_v4(),
            live,
        }
    }
}

/// Counts one open socket. Dropping it releases the slot.
struct ConnectionGuard {
    presence: Presence,
    id: Uuid,
    live: usize,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let live = self.presence.connections.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::info!(connection_id = %self.id, connections = live, "Socket disconnected");
    }
}

/// GET /socket
pub async fn socket(
    ws: WebSocketUpgrade,
    State(presence): State<Presence>,
    client: ClientInfo,
) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, presence, client))
}

async fn serve_socket(mut socket: WebSocket, presence: Presence, client: ClientInfo) {
    let guard = presence.enter();
    tracing::info!(
        connection_id = %guard.id,
        ip = %client.ip_string(),
        connections = guard.live,
        "Socket connected"
    );

    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %guard.id, error = %e, "Socket read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_count_follows_guards() {
        let presence = Presence::new();
        let first = presence.enter();
        let second = presence.enter();
        assert_eq!(presence.connections(), 2);
        assert_eq!(second.live, 2);

        drop(first);
        assert_eq!(presence.connections(), 1);
        drop(second);
        assert_eq!(presence.connections(), 0);
    }
}
