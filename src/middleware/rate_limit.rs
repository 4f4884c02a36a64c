use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::AuthUser;
use crate::error::ApiError;

const ANONYMOUS: &str = "anonymous";

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter per user, held in process memory.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    buckets: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(enabled: bool, max_requests: u32, window: Duration) -> Self {
        Self {
            enabled,
            max_requests,
            window,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config() -> Self {
        let api = &crate::config::config().api;
        Self::new(
            api.enable_rate_limiting,
            api.rate_limit_requests,
            Duration::from_secs(api.rate_limit_window_secs),
        )
    }

    /// Counts one request for `key`. `Err` carries the seconds until the
    /// window resets.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), u64> {
        if !self.enabled {
            return Ok(());
        }
        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let window = self.window;
        let bucket = buckets.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        if now.duration_since(bucket.started) >= window {
            bucket.started = now;
            bucket.count = 0;
            // Drop everyone else whose window has also rolled over
            buckets.retain(|k, w| k == key || now.duration_since(w.started) < window);
        }

        let Some(bucket) = buckets.get_mut(key) else {
            return Ok(());
        };
        bucket.count += 1;
        if bucket.count > self.max_requests {
            let elapsed = now.duration_since(bucket.started);
            let retry = window.saturating_sub(elapsed).as_secs().max(1);
            return Err(retry);
        }
        Ok(())
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.buckets.lock().map(|b| b.len()).unwrap_or(0)
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.id.to_string())
        .unwrap_or_else(|| ANONYMOUS.to_string());

    if let Err(retry_after) = limiter.check(&key, Instant::now()) {
        tracing::warn!(key = %key, retry_after, "Rate limit exceeded");
        return Err(ApiError::too_many_requests("Too many requests, please slow down", retry_after));
    }
    Ok(next.run(request).await)
}
