//! Fixed-window rate limiter for the `/api` routes.
//!
//! One counter per wall-clock second, shared by every caller. Applied as
//! an axum middleware with the limiter passed as an `Extension`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::error::ApiError;

/// Default budget for the `/api` routes.
pub const DEFAULT_REQUESTS_PER_SEC: u64 = 100;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    count: Arc<AtomicU64>,
    /// Epoch second of the active window.
    window: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec: max_per_sec.max(1),
            count: Arc::new(AtomicU64::new(0)),
            window: Arc::new(AtomicU64::new(0)),
        }
    }

    fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.try_acquire_at(now)
    }

    fn try_acquire_at(&self, now: u64) -> bool {
        let current = self.window.load(Ordering::Relaxed);
        if now != current
            && self
                .window
                .compare_exchange(current, now, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            self.count.store(1, Ordering::Relaxed);
            return true;
        }

        let prev = self.count.fetch_add(1, Ordering::Relaxed);
        prev < self.max_per_sec
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_SEC)
    }
}

pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        next.run(req).await
    } else {
        debug!(path = %req.uri().path(), "Request rate limited");
        ApiError::TooManyRequests("Too many requests, please try again in a moment".to_string())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_per_window() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.try_acquire_at(10));
        assert!(limiter.try_acquire_at(10));
        assert!(limiter.try_acquire_at(10));
        assert!(!limiter.try_acquire_at(10));
    }

    #[test]
    fn test_new_window_resets() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.try_acquire_at(10));
        assert!(!limiter.try_acquire_at(10));
        assert!(limiter.try_acquire_at(11));
    }

    #[test]
    fn test_zero_budget_still_admits_one() {
        let limiter = RateLimiter::new(0);
        assert!(limiter.try_acquire_at(5));
        assert!(!limiter.try_acquire_at(5));
    }
}
