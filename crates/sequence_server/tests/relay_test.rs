//! End-to-end relay behaviour over real WebSocket connections.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use sequence_core::{GameSession, Seat, legal_targets};
use sequence_server::{Relay, ServerConfig, router, serve};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> (String, Arc<Relay>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let relay = Arc::new(Relay::new(ServerConfig::default()));
    tokio::spawn(serve(listener, relay.clone()));
    (format!("ws://{}/ws", addr), relay)
}

async fn connect(url: &str) -> Client {
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

async fn recv(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a message")
            .unwrap()
            .unwrap();
        if frame.is_text() {
            return serde_json::from_str(frame.to_text().unwrap()).unwrap();
        }
    }
}

/// Host creates, guest joins. Returns both sockets and the room code.
async fn paired(url: &str) -> (Client, Client, String) {
    let mut host = connect(url).await;
    send(&mut host, json!({"type": "create", "playerName": "ann"})).await;
    let created = recv(&mut host).await;
    assert_eq!(created["type"], "created");
    let code = created["gameId"].as_str().unwrap().to_string();

    let mut guest = connect(url).await;
    send(
        &mut guest,
        json!({"type": "join", "gameId": code, "playerName": "bob"}),
    )
    .await;
    let joined = recv(&mut guest).await;
    assert_eq!(joined["type"], "gameState");
    assert_eq!(joined["gameState"]["players"][1]["name"], "bob");
    assert_eq!(
        joined["gameState"]["players"][1]["hand"]
            .as_array()
            .unwrap()
            .len(),
        7
    );

    let notice = recv(&mut host).await;
    assert_eq!(notice["type"], "playerJoined");
    (host, guest, code)
}

#[tokio::test]
async fn test_create_join_move_round() {
    let (url, relay) = start_server().await;
    let (mut host, mut guest, code) = paired(&url).await;

    let mut state: GameSession = relay.registry().state(&code).unwrap();
    let hand = state.player(Seat::Host).hand().clone();
    let (index, target) = hand
        .iter()
        .enumerate()
        .find_map(|(i, card)| {
            legal_targets(&state, Seat::Host, *card)
                .first()
                .map(|t| (i, *t))
        })
        .unwrap();
    state.play(Seat::Host, index, target).unwrap();

    send(
        &mut host,
        json!({"type": "move", "gameState": serde_json::to_value(&state).unwrap()}),
    )
    .await;

    let moved = recv(&mut guest).await;
    assert_eq!(moved["type"], "move");
    assert_eq!(moved["gameState"]["currentPlayer"], 1);
    assert_eq!(moved["gameState"]["gameId"], code.as_str());

    let stored = relay.registry().state(&code).unwrap();
    assert_eq!(stored.current_player(), Seat::Guest);
    assert_eq!(stored.board(), state.board());
}

#[tokio::test]
async fn test_join_errors() {
    let (url, _relay) = start_server().await;
    let (_host, _guest, code) = paired(&url).await;

    let mut late = connect(&url).await;
    send(&mut late, json!({"type": "join", "gameId": code})).await;
    let reply = recv(&mut late).await;
    assert_eq!(reply, json!({"type": "error", "message": "Game already has two players"}));

    send(&mut late, json!({"type": "join", "gameId": "NOPE99"})).await;
    let reply = recv(&mut late).await;
    assert_eq!(reply, json!({"type": "error", "message": "Game not found"}));
}

#[tokio::test]
async fn test_garbage_keeps_connection_open() {
    let (url, _relay) = start_server().await;
    let mut ws = connect(&url).await;
    ws.send(Message::text("definitely not json")).await.unwrap();
    let reply = recv(&mut ws).await;
    assert_eq!(reply["type"], "error");

    send(&mut ws, json!({"type": "create"})).await;
    let created = recv(&mut ws).await;
    assert_eq!(created["type"], "created");
    assert_eq!(created["gameState"]["players"][0]["name"], "Player 1");
}

#[tokio::test]
async fn test_guest_disconnect_notifies_host() {
    let (url, relay) = start_server().await;
    let (mut host, guest, code) = paired(&url).await;

    drop(guest);
    let notice = recv(&mut host).await;
    assert_eq!(notice["type"], "playerDisconnected");
    assert!(relay.registry().state(&code).is_some());
}

#[tokio::test]
async fn test_host_disconnect_removes_room() {
    let (url, relay) = start_server().await;
    let (host, mut guest, code) = paired(&url).await;

    drop(host);
    let notice = recv(&mut guest).await;
    assert_eq!(notice["type"], "playerDisconnected");
    assert!(relay.registry().state(&code).is_none());
}

#[tokio::test]
async fn test_health_and_rooms_routes() {
    let relay = Arc::new(Relay::new(ServerConfig::default()));

    let response = router(relay.clone())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok");

    let response = router(relay)
        .oneshot(Request::get("/rooms").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let rooms: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rooms, json!([]));
}
