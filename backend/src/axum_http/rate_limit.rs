use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use crates::infra::db::repositories::rate_limits::RateLimitPostgres;
use tracing::warn;

use crate::{
    axum_http::error_responses::error_response,
    usecases::rate_limiter::{RateLimitDecision, RateLimiter},
};

const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<RateLimiter<RateLimitPostgres>>,
    scope: &'static str,
}

impl RateLimitState {
    pub fn new(limiter: Arc<RateLimiter<RateLimitPostgres>>, scope: &'static str) -> Self {
        Self { limiter, scope }
    }
}

/// Last hop of `x-forwarded-for`, else the socket peer.
///
/// Only the last hop is written by the reverse proxy in front of the API;
/// earlier hops come from the client and can be forged. Deployments without
/// such a proxy should strip the header at the edge.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .map(str::trim)
        .and_then(|value| value.parse::<IpAddr>().ok())
        .map(|ip| ip.to_string())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn enforce_rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = format!("{}:{}", state.scope, client_ip(request.headers(), peer));

    match state.limiter.check(&key, Utc::now()).await {
        RateLimitDecision::Allowed { .. } => next.run(request).await,
        RateLimitDecision::Limited {
            retry_after_seconds,
        } => {
            warn!(%key, retry_after_seconds, "rate_limit: request rejected");
            let mut response = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Demasiadas solicitudes, intentá de nuevo en unos segundos",
            );
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_on_hop_appended_by_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 203.0.113.7 "),
        );
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn ignores_unparseable_forwarded_values() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, rotate-me-123"),
        );
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.9");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let peer: SocketAddr = "198.51.100.4:443".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "198.51.100.4");
        assert_eq!(client_ip(&HeaderMap::new(), None), UNKNOWN_CLIENT);
    }
}
