//! Axum router construction for the chat API.
//!
//! Assembles all routes (REST, streaming, `WebSocket`, and the optional
//! demo streams) into a single [`Router`] with CORS and HTTP tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{demo, handlers, stream, ws};

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/status` -- message and subscriber counts
/// - `POST /api/messages` -- publish a message
/// - `GET /api/messages` -- message history
/// - `GET /api/messages/live` -- live feed as NDJSON
/// - `GET /api/messages/events` -- live feed as server-sent events
/// - `GET /ws/messages` -- live feed over `WebSocket`
///
/// When demo streams are enabled it also mounts:
/// - `GET /api/demo/greetings/{name}` -- endless greetings as NDJSON
/// - `GET /api/demo/canned` -- canned messages as server-sent events
///
/// CORS is configured to allow any origin so browser clients on other
/// ports can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        // Status
        .route("/", get(handlers::index))
        .route("/api/status", get(handlers::status))
        // Messages
        .route(
            "/api/messages",
            get(handlers::list_messages).post(handlers::publish),
        )
        .route("/api/messages/live", get(stream::live_ndjson))
        .route("/api/messages/events", get(stream::live_sse))
        // WebSocket
        .route("/ws/messages", get(ws::ws_messages));

    if state.demo.enabled {
        router = router
            .route("/api/demo/greetings/{name}", get(demo::demo_greetings))
            .route("/api/demo/canned", get(demo::demo_canned));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
