//! HTTP API and terminal chat for the hospital coordinator.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/v1/messages` - Send a message to the coordinator
//! - `GET /api/v1/conversation` - Turns, active agent and system log
//! - `GET /api/v1/agents` - Agent kinds with labels and descriptions
//! - `GET /api/v1/tools` - Tool catalog advertised to the model
//! - `GET /api/v1/dashboard` - Panel for the active agent plus mock records
//!
//! # Architecture
//!
//! ```text
//! Browser / curl           Terminal
//!    │                        │
//!    ▼                        ▼
//! ┌─────────────────┐  ┌─────────────┐
//! │   API Gateway   │  │    REPL     │
//! │     (Axum)      │  │ (medcoord   │
//! └────────┬────────┘  │    chat)    │
//!          │           └──────┬──────┘
//!          └────────┬─────────┘
//!                   ▼
//!          ┌─────────────────┐
//!          │     Session     │
//!          └─────────────────┘
//! ```

pub mod repl;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use state::AppState;

fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let allow_origin = match origins {
        Some(origins) if !origins.iter().any(|o| o == "*") => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
        _ => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the API router with all routes configured.
///
/// `cors_origins` of `None` or containing `"*"` allows any origin.
pub fn create_router(state: Arc<AppState>, cors_origins: Option<Vec<String>>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/messages", post(routes::send_message))
        .route("/api/v1/conversation", get(routes::conversation))
        .route("/api/v1/agents", get(routes::agents))
        .route("/api/v1/tools", get(routes::tools))
        .route("/api/v1/dashboard", get(routes::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    cors_origins: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let router = create_router(state, cors_origins);

    info!(%addr, "Starting medcoord API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
