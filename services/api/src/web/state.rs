//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::middleware::RateLimiter;
use lesson_booking_core::{LessonService, OrderService};
use std::sync::Arc;
use std::time::Instant;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub lessons: LessonService,
    pub orders: OrderService,
    pub config: Arc<Config>,
    pub rate_limiter: Arc<RateLimiter>,
    /// When the process started serving; `/health` reports uptime from it.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, lessons: LessonService, orders: OrderService) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            config.rate_limit_window,
        ));
        Self {
            lessons,
            orders,
            config,
            rate_limiter,
            started_at: Instant::now(),
        }
    }
}
