//! CORS policy for browser clients and the embedding agent host.
//!
//! Note:
//! - Applied as the outermost layer, so every response carries the headers:
//!   redirects, 401s, assets, and the 408/413 produced by the HTTP layers.
//! - Preflight (`OPTIONS`) requests are answered by the gateway with 204 and no
//!   body; they never reach a handler.
//!
//! Policy:
//! - Credentials are allowed, so the origin is echoed instead of `*` whenever
//!   the request carries one.
//! - Allowed origins: `CORS_ALLOWED_ORIGINS` plus our own public origin.
//! - Development with an empty allowlist: any origin is echoed.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::config::Config;

const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const ALLOW_HEADERS: &str = "authorization, content-type, accept, x-request-id, mcp-session-id, mcp-protocol-version, last-event-id";
const MAX_AGE_SECONDS: &str = "86400";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allow_any_origin: bool,
}

impl CorsPolicy {
    pub fn from_config(config: &Config) -> Self {
        let mut allowed_origins = config.cors_allowed_origins.clone();
        allowed_origins.push(config.public_base_url.clone());

        Self {
            allow_any_origin: !config.app_env.is_production()
                && config.cors_allowed_origins.is_empty(),
            allowed_origins,
        }
    }

    fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        let Some(origin) = origin else {
            return Some(HeaderValue::from_static("*"));
        };

        let allowed = self.allow_any_origin
            || origin
                .to_str()
                .map(|o| self.allowed_origins.iter().any(|a| a == o))
                .unwrap_or(false);

        allowed.then(|| origin.clone())
    }

    /// Stamp the cross-origin headers onto an outgoing response.
    pub fn stamp(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(value) = self.allow_origin(origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECONDS),
        );
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }

}

/// Wrap `router` (all other layers included) with the CORS stamp.
pub fn apply(router: Router, policy: Arc<CorsPolicy>) -> Router {
    router.layer(middleware::from_fn_with_state(policy, cors_middleware))
}

async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();
    let mut response = next.run(req).await;
    policy.stamp(origin.as_ref(), response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;

    fn origin(value: &'static str) -> HeaderValue {
        HeaderValue::from_static(value)
    }

    #[test]
    fn development_echoes_any_origin() {
        let policy = CorsPolicy::from_config(&test_config("http://auth.test"));
        let mut headers = HeaderMap::new();

        policy.stamp(Some(&origin("https://chat.example.com")), &mut headers);

        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://chat.example.com"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET,POST,PUT,DELETE,OPTIONS"
        );
    }

    #[test]
    fn allowlist_is_enforced_when_configured() {
        let mut config = test_config("http://auth.test");
        config.cors_allowed_origins = vec!["https://chat.example.com".into()];
        let policy = CorsPolicy::from_config(&config);

        let mut allowed = HeaderMap::new();
        policy.stamp(Some(&origin("https://chat.example.com")), &mut allowed);
        assert!(allowed.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let mut own = HeaderMap::new();
        policy.stamp(Some(&origin("http://localhost:3000")), &mut own);
        assert!(own.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let mut denied = HeaderMap::new();
        policy.stamp(Some(&origin("https://evil.example.com")), &mut denied);
        assert!(!denied.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[test]
    fn requests_without_origin_get_wildcard() {
        let policy = CorsPolicy::from_config(&test_config("http://auth.test"));
        let mut headers = HeaderMap::new();

        policy.stamp(None, &mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
