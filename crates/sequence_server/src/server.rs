//! HTTP and WebSocket surface of the relay.

use crate::protocol::ServerMessage;
use crate::relay::Relay;
use crate::room::RoomSummary;
use axum::body::Body;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::Request;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Queued outbound frames per socket before messages are dropped.
const OUTBOUND_CAPACITY: usize = 64;

/// How often idle rooms are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Builds the router: WebSocket at `/` and `/ws`, plus `/health` and `/rooms`.
#[instrument(skip(relay))]
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/rooms", get(rooms))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(relay)
}

/// Serves the relay on an already-bound listener until the process exits.
#[instrument(skip(listener, relay))]
pub async fn serve(listener: TcpListener, relay: Arc<Relay>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    let prune = spawn_pruner(relay.clone());
    info!(%addr, "Relay listening");

    let result = axum::serve(listener, router(relay)).await;
    prune.abort();
    result
}

/// Sweeps idle rooms on a fixed interval.
fn spawn_pruner(relay: Arc<Relay>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let max_idle = relay.config().idle_timeout();
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            relay.registry().prune_idle(max_idle);
        }
    })
}

async fn health() -> &'static str {
    "ok"
}

async fn rooms(State(relay): State<Arc<Relay>>) -> Json<Vec<RoomSummary>> {
    Json(relay.registry().summaries())
}

async fn ws_handler(State(relay): State<Arc<Relay>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

/// Pumps one socket: a writer task drains the outbound queue while this
/// task feeds inbound text frames to the relay.
async fn handle_socket(socket: WebSocket, relay: Arc<Relay>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);
    let mut conn = relay.connect(tx);
    let id = conn.id();

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(connection = id, error = %e, "Failed to encode message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                debug!(connection = id, "Socket closed while sending");
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => relay.handle_text(&mut conn, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(connection = id, error = %e, "Socket error");
                break;
            }
        }
    }

    relay.disconnect(&mut conn);
    drop(conn);
    // Let queued replies flush; the writer ends once every sender is gone.
    if tokio::time::timeout(Duration::from_secs(1), writer).await.is_err() {
        debug!(connection = id, "Writer did not finish in time");
    }
}
