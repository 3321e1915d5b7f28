use axum::{routing::get, Router};
use interpcast::auth::{JwtAuthenticator, TokenConfig};
use interpcast::registry::ConnectionRegistry;
use interpcast::shared::AppState;
use interpcast::stream::{connections_count, stream_handler, RoomBroadcaster};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interpcast=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting live interpretation relay server");

    // The registry answers counts; the broadcaster owns fan-out and keeps
    // the registry in sync on every subscribe/unsubscribe.
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = Arc::new(RoomBroadcaster::new(Arc::clone(&registry)));
    let authenticator = Arc::new(JwtAuthenticator::new(TokenConfig::new()));

    let app_state = AppState::new(registry, broadcaster, authenticator);

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/ws/stream/:language_code", get(stream_handler))
        .route("/api/connections/:language_code", get(connections_count))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
