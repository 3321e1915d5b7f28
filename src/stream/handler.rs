use axum::{
    extract::{Path, RawQuery, State, WebSocketUpgrade},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use super::messages::{ConnectionCountResponse, OutboundEvent};
use super::socket::StreamConnection;
use crate::auth::Identity;
use crate::registry::ConnectionId;
use crate::shared::{AppError, AppState};

/// Pull the bearer token out of the raw query string. The first
/// occurrence of a `token` parameter wins; repeats are ignored rather
/// than rejected. Absence is valid and maps to anonymous.
fn token_from_query(query: Option<&str>) -> Option<String> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query.unwrap_or("")).unwrap_or_default();
    pairs
        .into_iter()
        .find(|(name, _)| name == "token")
        .map(|(_, value)| value)
}

/// Resolve the caller's identity and decide whether the connection may
/// proceed. Runs before any registry or broadcaster mutation; a
/// rejection leaves no trace in either.
async fn authorize_stream(
    state: &AppState,
    language_code: &str,
    token: Option<&str>,
) -> Result<String, AppError> {
    match state.authenticator.authenticate(token).await {
        Identity::Staff { username } => Ok(username),
        Identity::Anonymous => {
            warn!(
                language = %language_code,
                "Rejecting stream connection without staff credentials"
            );
            Err(AppError::Unauthorized(
                "Staff credentials required".to_string(),
            ))
        }
    }
}

/// WebSocket endpoint for a language stream
///
/// GET /ws/stream/{language_code}?token=<JWT>
/// Anonymous and non-staff callers are rejected before the upgrade.
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    Path(language_code): Path<String>,
    RawQuery(query): RawQuery,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    info!(language = %language_code, "Stream connection requested");

    let token = token_from_query(query.as_deref());
    let username = authorize_stream(&state, &language_code, token.as_deref()).await?;

    info!(
        language = %language_code,
        username = %username,
        "Stream authentication successful"
    );

    Ok(ws.on_upgrade(move |socket| {
        handle_stream_connection(socket, language_code, username, state)
    }))
}

/// Handle the upgraded WebSocket connection
async fn handle_stream_connection(
    socket: axum::extract::ws::WebSocket,
    language_code: String,
    username: String,
    state: AppState,
) {
    let handle = ConnectionId::new();

    info!(
        language = %language_code,
        username = %username,
        handle = %handle,
        "Stream connection established"
    );

    // Create the outbound channel (broadcaster -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<OutboundEvent>();

    // Join the room and announce the new count; the joiner is already
    // subscribed when the count is computed, so it sees itself included.
    state
        .broadcaster
        .subscribe(&language_code, handle, outbound_sender)
        .await;

    let connection = StreamConnection::new(
        language_code.clone(),
        handle,
        Box::new(socket),
        outbound_receiver,
        Arc::clone(&state.broadcaster),
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(
                language = %language_code,
                username = %username,
                "Stream connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                language = %language_code,
                username = %username,
                error = ?e,
                "Stream connection error"
            );
        }
    }

    // Single cleanup path for every termination trigger: leaves the
    // registry and announces the new count to the remaining members.
    state.broadcaster.unsubscribe(&language_code, handle).await;

    info!(
        language = %language_code,
        username = %username,
        handle = %handle,
        "Stream disconnect complete"
    );
}

/// HTTP handler for the live connection count of one language room
///
/// GET /api/connections/{language_code}
/// Reads the registry directly; unknown rooms report zero.
#[instrument(name = "connections_count", skip(state))]
pub async fn connections_count(
    Path(language_code): Path<String>,
    State(state): State<AppState>,
) -> Json<ConnectionCountResponse> {
    let active_connections = state.registry.count(&language_code).await;

    Json(ConnectionCountResponse {
        language: language_code,
        active_connections,
    })
}
