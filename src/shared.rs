use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::Authenticator;
use crate::registry::ConnectionRegistry;
use crate::stream::RoomBroadcaster;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: Arc<RoomBroadcaster>,
    pub authenticator: Arc<dyn Authenticator + Send + Sync>,
}

impl AppState {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        broadcaster: Arc<RoomBroadcaster>,
        authenticator: Arc<dyn Authenticator + Send + Sync>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            authenticator,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
