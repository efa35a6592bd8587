use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use crate::response::json_error;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

// 100 requests per 15-minute fixed window, per client IP.
const WINDOW: Duration = Duration::from_secs(15 * 60);
const MAX_REQUESTS: u64 = 100;

struct Window {
    started: Instant,
    count: u64,
}

#[derive(Default)]
struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, Window>>,
}

enum Decision {
    Allowed { remaining: u64, reset_secs: u64 },
    Limited { retry_after_secs: u64 },
}

impl RateLimiter {
    async fn check(&self, ip: IpAddr) -> Decision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= WINDOW {
            window.started = now;
            window.count = 0;
        }

        let reset = WINDOW.saturating_sub(now.duration_since(window.started));
        if window.count >= MAX_REQUESTS {
            return Decision::Limited {
                retry_after_secs: reset.as_secs().max(1),
            };
        }

        window.count += 1;
        Decision::Allowed {
            remaining: MAX_REQUESTS - window.count,
            reset_secs: reset.as_secs(),
        }
    }
}

static LIMITER: OnceLock<Arc<RateLimiter>> = OnceLock::new();

pub async fn api_rate_limit(req: Request<Body>, next: Next) -> Response {
    if is_test_env() {
        return next.run(req).await;
    }

    // No connect info (e.g. in-process router tests) means no IP to key on.
    let Some(ip) = client_ip(&req) else {
        return next.run(req).await;
    };
    if ip.is_loopback() {
        return next.run(req).await;
    }

    let limiter = LIMITER.get_or_init(|| Arc::new(RateLimiter::default()));
    match limiter.check(ip).await {
        Decision::Allowed {
            remaining,
            reset_secs,
        } => {
            let mut response = next.run(req).await;
            set_header(&mut response, RATE_LIMIT_LIMIT, MAX_REQUESTS);
            set_header(&mut response, RATE_LIMIT_REMAINING, remaining);
            set_header(&mut response, RATE_LIMIT_RESET, reset_secs);
            response
        }
        Decision::Limited { retry_after_secs } => {
            let mut response = json_error(
                StatusCode::TOO_MANY_REQUESTS,
                "TOO_MANY_REQUESTS",
                "Too many requests, please try again later",
            )
            .into_response();
            set_header(&mut response, RETRY_AFTER, retry_after_secs);
            response
        }
    }
}

fn client_ip(req: &Request<Body>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn is_test_env() -> bool {
    std::env::var("NODE_ENV")
        .map(|value| value == "test")
        .unwrap_or(false)
}

fn set_header(response: &mut Response, name: HeaderName, value: u64) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        response.headers_mut().insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn window_limits_then_resets_count() {
        let limiter = RateLimiter::default();
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));

        for _ in 0..MAX_REQUESTS {
            assert!(matches!(limiter.check(ip).await, Decision::Allowed { .. }));
        }
        assert!(matches!(limiter.check(ip).await, Decision::Limited { .. }));
    }

    #[tokio::test]
    async fn distinct_ips_do_not_share_windows() {
        let limiter = RateLimiter::default();
        let first = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1));
        let second = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 2));

        for _ in 0..MAX_REQUESTS {
            limiter.check(first).await;
        }
        assert!(matches!(
            limiter.check(second).await,
            Decision::Allowed { .. }
        ));
    }
}
