use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Maximum requests allowed within a fixed window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Strict limit for auth endpoints: 5 requests per minute.
pub const AUTH_LIMIT: RateLimitConfig = RateLimitConfig {
    max_requests: 5,
    window_seconds: 60,
};

/// Standard API limit: 30 requests per minute.
pub const API_LIMIT: RateLimitConfig = RateLimitConfig {
    max_requests: 30,
    window_seconds: 60,
};

/// Relaxed limit: 100 requests per minute.
pub const RELAXED_LIMIT: RateLimitConfig = RateLimitConfig {
    max_requests: 100,
    window_seconds: 60,
};

/// Outcome of a rate-limit check. Rejection is a normal outcome, not an
/// error; callers translate `allowed = false` into a 429.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in_seconds: u64,
}

struct Entry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window in-process rate limiter keyed by client identifier.
///
/// The map is exclusively owned here; check-and-increment happens under a
/// single lock so two concurrent requests cannot both pass a check that
/// should have rejected the second.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a request from `identifier` fits in its current window,
    /// incrementing the counter if it does. An expired entry is treated as
    /// absent regardless of whether the sweeper has removed it yet.
    pub async fn check(&self, identifier: &str, config: RateLimitConfig) -> RateLimitDecision {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get_mut(identifier) {
            Some(entry) if entry.reset_at > now => {
                if entry.count >= config.max_requests {
                    warn!(identifier, "rate limit exceeded");
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_in_seconds: ceil_seconds(entry.reset_at - now),
                    };
                }
                entry.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: config.max_requests - entry.count,
                    reset_in_seconds: ceil_seconds(entry.reset_at - now),
                }
            }
            _ => {
                entries.insert(
                    identifier.to_string(),
                    Entry {
                        count: 1,
                        reset_at: now + Duration::from_secs(config.window_seconds),
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: config.max_requests - 1,
                    reset_in_seconds: config.window_seconds,
                }
            }
        }
    }

    /// Drop entries whose window has fully elapsed. Best-effort housekeeping
    /// to bound memory; correctness never depends on it.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at > now);
        before - entries.len()
    }
}

/// Periodic sweep of expired entries, every 5 minutes.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5 * 60));
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = limiter.sweep().await;
            if removed > 0 {
                debug!(removed, "swept expired rate-limit entries");
            }
        }
    });
}

/// Standard per-IP limit for authenticated API routes.
pub async fn api_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state, "api", API_LIMIT, request, next).await
}

/// Relaxed per-IP limit for cheap read-only routes.
pub async fn relaxed_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state, "relaxed", RELAXED_LIMIT, request, next).await
}

async fn enforce(
    state: &AppState,
    scope: &str,
    config: RateLimitConfig,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(request.headers());
    let decision = state
        .rate_limiter
        .check(&format!("{scope}:{ip}"), config)
        .await;
    if !decision.allowed {
        return Err(ApiError::RateLimited {
            retry_after: decision.reset_in_seconds,
        });
    }

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        response
            .headers_mut()
            .insert("x-ratelimit-remaining", value);
    }
    Ok(response)
}

/// Client identity for rate-limit keys: first hop of `x-forwarded-for`,
/// then `x-real-ip`, else a fixed fallback for local development.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real_ip.to_string();
    }
    "unknown".to_string()
}

fn ceil_seconds(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sixth_request_in_window_is_rejected() {
        let limiter = RateLimiter::new();
        for i in 0..5 {
            let decision = limiter.check("login:1.2.3.4", AUTH_LIMIT).await;
            assert!(decision.allowed, "request {} should pass", i + 1);
            assert_eq!(decision.remaining, 4 - i);
        }
        let decision = limiter.check("login:1.2.3.4", AUTH_LIMIT).await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(decision.reset_in_seconds > 0 && decision.reset_in_seconds <= 60);
    }

    #[tokio::test]
    async fn fresh_window_after_expiry_allows_again() {
        let limiter = RateLimiter::new();
        let short = RateLimitConfig {
            max_requests: 5,
            window_seconds: 1,
        };
        for _ in 0..5 {
            assert!(limiter.check("ip", short).await.allowed);
        }
        assert!(!limiter.check("ip", short).await.allowed);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let decision = limiter.check("ip", short).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
    }

    #[tokio::test]
    async fn identifiers_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.check("a", AUTH_LIMIT).await;
        }
        assert!(!limiter.check("a", AUTH_LIMIT).await.allowed);
        assert!(limiter.check("b", AUTH_LIMIT).await.allowed);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let limiter = RateLimiter::new();
        let short = RateLimitConfig {
            max_requests: 5,
            window_seconds: 1,
        };
        limiter.check("old", short).await;
        limiter.check("fresh", AUTH_LIMIT).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(limiter.sweep().await, 1);
        // The fresh entry keeps its count.
        let decision = limiter.check("fresh", AUTH_LIMIT).await;
        assert_eq!(decision.remaining, 3);
    }

    #[test]
    fn presets_match_endpoint_policy() {
        assert_eq!(AUTH_LIMIT.max_requests, 5);
        assert_eq!(AUTH_LIMIT.window_seconds, 60);
        assert_eq!(API_LIMIT.max_requests, 30);
        assert_eq!(RELAXED_LIMIT.max_requests, 100);
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.7");

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.0.0.2");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
