//! services/api/src/web/middleware.rs
//!
//! Per-client rate limiting for every route.
//!
//! Each client IP gets a fixed window of `max_requests` requests; once spent,
//! requests are rejected with 429 until the window rolls over. Requests that
//! arrive without peer information (e.g. in-process tests) share one bucket.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ErrorResponse;
use crate::web::state::AppState;

/// Expired windows are swept once this many clients are tracked, at most once
/// per window length.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Default)]
struct Clients {
    windows: HashMap<IpAddr, Window>,
    last_sweep: Option<Instant>,
}

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    sweep_threshold: usize,
    clients: Mutex<Clients>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            sweep_threshold: SWEEP_THRESHOLD,
            clients: Mutex::new(Clients::default()),
        }
    }

    /// Counts one request from `client` at `now`.
    pub async fn check(&self, client: IpAddr, now: Instant) -> RateDecision {
        let mut clients = self.clients.lock().await;
        let sweep_due = clients
            .last_sweep
            .map_or(true, |last| now.duration_since(last) >= self.window);
        if clients.windows.len() >= self.sweep_threshold && sweep_due {
            clients
                .windows
                .retain(|_, w| now.duration_since(w.started) < self.window);
            clients.last_sweep = Some(now);
        }

        let window = clients.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        let elapsed = now.duration_since(window.started);
        if elapsed >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            return RateDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }
        window.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - window.count,
        }
    }
}

/// Middleware that rejects clients who exceeded their request budget.
pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match state.rate_limiter.check(client, Instant::now()).await {
        RateDecision::Allowed { .. } => next.run(req).await,
        RateDecision::Limited { retry_after } => {
            warn!("Rate limit exceeded for {}", client);
            // Round up so clients never retry a moment too early.
            let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            let body = ErrorResponse {
                error: "Too many requests, please try again later.".to_string(),
            };
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}
