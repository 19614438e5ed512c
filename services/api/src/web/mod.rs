pub mod images;
pub mod lessons;
pub mod meta;
pub mod middleware;
pub mod orders;
pub mod rest;
pub mod state;

use crate::config::Config;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{self, ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub use images::image_handler;
pub use lessons::{list_lessons_handler, search_lessons_handler, update_lesson_handler};
pub use meta::{health_handler, root_handler};
pub use middleware::rate_limit;
pub use orders::{create_order_handler, list_orders_handler};
use state::AppState;

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);
    if config.cors_allowed_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(config.cors_allowed_origins.clone())
    }
}

/// Builds the full HTTP application: routes, CORS, rate limiting, security
/// headers and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    let api_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/lessons", get(list_lessons_handler))
        .route("/lessons/search", get(search_lessons_handler))
        .route("/lessons/{id}", put(update_lesson_handler))
        .route("/order", get(list_orders_handler).post(create_order_handler))
        .layer(cors_layer(&config));

    // Images set their own wildcard CORS header, so they sit outside the CORS layer.
    let image_routes = Router::new().route("/images/{*path}", get(image_handler));

    Router::new()
        .merge(api_routes)
        .merge(image_routes)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(axum_middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
