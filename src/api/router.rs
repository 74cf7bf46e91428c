//! HTTP router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router with all endpoints under `/api/`.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/chat", post(endpoints::chat::send))
        .route("/tickets", get(endpoints::tickets::list))
        .route("/tickets/:id", get(endpoints::tickets::detail))
        .route("/tickets/:id/resolve", post(endpoints::tickets::resolve))
        .route(
            "/conversations/:id/messages",
            get(endpoints::conversations::messages),
        )
        .with_state(ctx);

    // Browser chat client is served from another origin
    Router::new()
        .nest("/api", routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
