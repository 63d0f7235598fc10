use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post, put},
    Router,
};
use registry_links::LinkCheckQueue;
use registry_store::StatementStore;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

pub mod auth;
pub mod components;
pub mod error;
pub mod explore;
pub mod params;
pub mod statements;
pub mod templates;

pub struct AppState {
    pub store: StatementStore,
    /// `None` when URL checks are disabled.
    pub link_checks: Option<LinkCheckQueue>,
    pub session_secret: String,
    pub page_size: i64,
}

pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        // Health check
        .route("/health", get(|| async { "ok" }))
        // Public listing (Dioxus SSR) and CSV download
        .route("/explore", get(explore::explore))
        .route("/explore.csv", get(explore::explore_csv))
        .route("/statements/{id}/snapshot", get(statements::snapshot))
        // JSON API
        .route("/api/statements", post(statements::submit))
        .route("/api/statements/{id}/verification", put(statements::verify))
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        // Results depend on who is asking; never cache them
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only (no query params, no cookies)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
