//! Transport binary (C11): a thin `axum` WebSocket server that binds one
//! `SessionHandler` per connection and wires JSON text frames to/from it.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

use parley::message::OutboundRecord;
use parley::{Settings, SessionHandler};

/// Bound on the per-connection outbound record channel (session → WebSocket writer).
const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    env_logger::init();

    let settings = Arc::new(Settings::from_env());
    log::info!("starting parley-server on {}:{}", settings.host, settings.port);

    let cors = build_cors_layer(&settings.frontend_url);

    let app = Router::new()
        .route("/ws/debate", get(ws_debate_handler))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(settings.clone());

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("server exited with error: {}", e);
        std::process::exit(1);
    }
}

/// Build the CORS layer scoped to `FRONTEND_URL` (§4.10, §6). A literal `"*"`
/// opts into a permissive wildcard with a warning logged, matching the corpus's
/// own origin-list-driven CORS setup rather than always wildcarding.
fn build_cors_layer(frontend_url: &str) -> CorsLayer {
    if frontend_url == "*" {
        log::warn!("FRONTEND_URL is \"*\"; allowing any origin through CORS");
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any),
        Err(e) => {
            log::warn!("FRONTEND_URL {:?} is not a valid origin header ({}); falling back to no allowed origins", frontend_url, e);
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_debate_handler(ws: WebSocketUpgrade, State(settings): State<Arc<Settings>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, settings))
}

/// Drive a single `/ws/debate` connection end to end: a writer task forwards
/// outbound records as JSON text frames, the reader loop feeds inbound text
/// frames to the session handler, and disconnecting cancels any in-flight debate.
async fn handle_socket(socket: WebSocket, settings: Arc<Settings>) {
    let (mut ws_writer, mut ws_reader) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<OutboundRecord>(OUTBOUND_CHANNEL_CAPACITY);

    let writer_handle = tokio::spawn(async move {
        while let Some(record) = out_rx.recv().await {
            match serde_json::to_string(&record) {
                Ok(json) => {
                    if ws_writer.send(WsMessage::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("failed to serialize outbound record: {}", e);
                }
            }
        }
    });

    let mut session = SessionHandler::new(settings, out_tx);

    while let Some(msg) = ws_reader.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                log::debug!("WebSocket read error: {}", e);
                break;
            }
        };

        match msg {
            WsMessage::Text(text) => session.handle_message(&text).await,
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    session.disconnect();
    writer_handle.abort();
}
