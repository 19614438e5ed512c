//! services/api/src/web/meta.rs
//!
//! The API landing page and the health probe.

use crate::web::state::AppState;
use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct Endpoints {
    pub lessons: &'static str,
    pub orders: &'static str,
    pub health: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    /// RFC 3339, UTC.
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
    pub environment: String,
}

/// GET / - API metadata
#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses((status = 200, description = "API metadata", body = RootResponse))
)]
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Welcome to the Lesson Management API",
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        endpoints: Endpoints {
            lessons: "/lessons",
            orders: "/order",
            health: "/health",
        },
    })
}

/// GET /health - Liveness probe; never touches the database
#[utoipa::path(
    get,
    path = "/health",
    tag = "meta",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.config.environment.clone(),
    })
}
