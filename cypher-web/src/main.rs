#![deny(missing_docs)]
//! A web server for hybrid one-time pad messaging.
//!
//! The server owns one recipient key pair, loaded from (or created in) the key
//! store named by `CYPHER_KEYS_PATH`. Clients encrypt for that key, or for any
//! other public key they supply, and hand payloads back for decryption.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use cypher_core::key_wrap::{DEFAULT_KEY_BITS, RecipientPublicKey};
use cypher_core::keystore::{self, KeyPair};
use cypher_core::{CypherError, Payload, session};
use local_ip_address::local_ip;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinError;
use tower_http::cors::CorsLayer;

const DEFAULT_PORT: u16 = 3000;

/// Shared application state
struct AppState {
    keys: KeyPair,
}

#[derive(Deserialize)]
struct SendRequest {
    plaintext: String,
    recipient_public_key: Option<String>,
}

#[derive(Deserialize)]
struct ReceiveRequest {
    payload: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = env::var("CYPHER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    // Set up the key store path from an environment variable or use a default.
    let key_path = env::var("CYPHER_KEYS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.cypher_keys"));
    let passphrase = env::var("CYPHER_PASSPHRASE").ok();

    println!("Using key store at: {}", key_path.display());
    let keys = match keystore::load_or_init(&key_path, passphrase.as_deref(), DEFAULT_KEY_BITS) {
        Ok(keys) => keys,
        Err(e) => {
            error!("Failed to open key store: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "Serving key {} (fingerprint {}).",
        keys.state.key_id, keys.state.fingerprint
    );

    let app = router(Arc::new(AppState { keys }));

    // Run the server.
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("listening on:");
    if let Ok(my_local_ip) = local_ip() {
        println!("  - http://{my_local_ip}:{port}");
    }
    println!("  - http://127.0.0.1:{port}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/keys/public", get(public_key_handler))
        .route("/api/messages/send", post(send_handler))
        .route("/api/messages/receive", post(receive_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

fn status_for(error: &CypherError) -> StatusCode {
    match error {
        CypherError::MalformedPayload(_)
        | CypherError::KeyTooLargeForWrap { .. }
        | CypherError::KeyTooShort { .. }
        | CypherError::UnwrapFailed
        | CypherError::IntegrityCheckFailed
        | CypherError::KeyEncoding(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &CypherError) -> (StatusCode, Json<Value>) {
    let status = status_for(error);
    if status.is_server_error() {
        error!("Request failed: {error}");
    } else {
        warn!("Rejected request: {error}");
    }
    (status, Json(json!({ "error": error.to_string() })))
}

fn join_error_response(error: &JoinError) -> (StatusCode, Json<Value>) {
    error!("Worker task failed: {error}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
}

/// Returns the server's public key and what it can carry.
async fn public_key_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let public = &state.keys.public;
    match public.to_pem() {
        Ok(pem) => (
            StatusCode::OK,
            Json(json!({
                "key_id": state.keys.state.key_id,
                "bits": state.keys.state.bits,
                "fingerprint": state.keys.state.fingerprint,
                "public_key_pem": pem,
                "max_message_len": public.max_message_len(),
            })),
        ),
        Err(e) => error_response(&e),
    }
}

async fn send_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendRequest>,
) -> (StatusCode, Json<Value>) {
    let recipient = match request.recipient_public_key {
        Some(pem) => match RecipientPublicKey::from_pem(&pem) {
            Ok(recipient) => recipient,
            Err(e) => return error_response(&e),
        },
        None => state.keys.public.clone(),
    };

    let plaintext = request.plaintext;
    let sealed =
        tokio::task::spawn_blocking(move || session::send(&plaintext, &recipient)).await;
    match sealed {
        Ok(Ok(payload)) => (
            StatusCode::OK,
            Json(json!({ "payload": payload.into_string() })),
        ),
        Ok(Err(e)) => error_response(&e),
        Err(e) => join_error_response(&e),
    }
}

async fn receive_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReceiveRequest>,
) -> (StatusCode, Json<Value>) {
    let payload = Payload::from(request.payload);
    let opened = tokio::task::spawn_blocking(move || {
        session::receive(&payload, &state.keys.private)
    })
    .await;
    match opened {
        Ok(Ok(received)) => {
            let (plaintext, integrity_ok) = received.into_parts();
            (
                StatusCode::OK,
                Json(json!({ "plaintext": plaintext, "integrity_ok": integrity_ok })),
            )
        }
        Ok(Err(e)) => error_response(&e),
        Err(e) => join_error_response(&e),
    }
}
