use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::{sync::Mutex, time::Instant};

use crate::error::{AppError, AppResult};

/// Expired windows are dropped once this many clients are tracked
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter per client address
///
/// Requests without a known peer address (no `ConnectInfo`) share one window.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<Option<IpAddr>, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request from `client`, failing once its window is used up
    pub async fn check(&self, client: Option<IpAddr>) -> AppResult<()> {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: Option<IpAddr>, now: Instant) -> AppResult<()> {
        let mut windows = self.windows.lock().await;

        if windows.len() >= PRUNE_THRESHOLD {
            let length = self.window;
            windows.retain(|_, window| now.duration_since(window.started) < length);
        }

        let window = windows.entry(client).or_insert(Window {
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
            let retry_after = self.window.saturating_sub(now.duration_since(window.started));
            tracing::warn!(
                client = ?client,
                limit = self.max_requests,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            return Err(AppError::RateLimited {
                message: "Too many requests from this IP, please try again later".to_string(),
                retry_after_secs: Some(retry_after.as_secs().max(1)),
            });
        }

        window.count += 1;
        Ok(())
    }
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip())
}

/// Rejects requests over the per-client limit with 429
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check(client_ip(&request)).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> Option<IpAddr> {
        Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)))
    }

    #[tokio::test]
    async fn test_blocks_after_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(ip(1), start).await.is_ok());
        }

        let result = limiter.check_at(ip(1), start + Duration::from_secs(15)).await;
        assert!(matches!(
            result,
            Err(AppError::RateLimited {
                retry_after_secs: Some(45),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at(ip(1), start).await.is_ok());
        assert!(limiter.check_at(ip(1), start).await.is_err());
        assert!(limiter.check_at(ip(2), start).await.is_ok());
        assert!(limiter.check_at(None, start).await.is_ok());
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at(ip(1), start).await.is_ok());
        assert!(limiter.check_at(ip(1), start + Duration::from_secs(59)).await.is_err());
        assert!(limiter.check_at(ip(1), start + Duration::from_secs(60)).await.is_ok());
    }

    #[test]
    fn test_client_ip_from_connect_info() {
        let address: SocketAddr = "192.168.1.7:52100".parse().unwrap();
        let mut request = axum::http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&request), None);

        request.extensions_mut().insert(ConnectInfo(address));
        assert_eq!(client_ip(&request), Some(address.ip()));
    }
}
