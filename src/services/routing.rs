//! Request classification for the gateway.
//!
//! Pure and total: every (method, path) pair maps to exactly one class, and the
//! rules are evaluated in a fixed order. Assets and machine endpoints must be
//! recognised before the session fallback so they never trigger a login redirect.

use axum::http::Method;

/// Static-file directories served without any auth check.
const STATIC_PREFIXES: &[&str] = &["/static/", "/_next/"];

const STATIC_EXTENSIONS: &[&str] = &[
    "ico", "png", "jpg", "jpeg", "gif", "svg", "webp", "css", "js", "woff", "woff2", "ttf", "eot",
    "json",
];

/// Endpoints that authenticate themselves (bearer token) or are public by protocol.
pub const TOOL_ENDPOINT_PREFIX: &str = "/mcp";
pub const RESOURCE_METADATA_PREFIX: &str = "/.well-known/oauth-protected-resource";
pub const EMBEDDED_ENTRY_PREFIX: &str = "/chatgpt";

const MACHINE_AUTH_PREFIXES: &[&str] = &[
    TOOL_ENDPOINT_PREFIX,
    RESOURCE_METADATA_PREFIX,
    EMBEDDED_ENTRY_PREFIX,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Preflight,
    Asset,
    MachineAuth,
    SessionGated,
}

pub fn classify(method: &Method, path: &str) -> Classification {
    if method == Method::OPTIONS {
        return Classification::Preflight;
    }
    if is_asset(path) {
        return Classification::Asset;
    }
    if MACHINE_AUTH_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return Classification::MachineAuth;
    }
    Classification::SessionGated
}

fn is_asset(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }

    // Only the last segment carries the extension ("/a.b/c" is not an asset).
    let file = path.rsplit('/').next().unwrap_or_default();
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => STATIC_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_is_preflight_before_anything_else() {
        for path in ["/", "/favicon.ico", "/mcp", "/api/oauth/decision"] {
            assert_eq!(classify(&Method::OPTIONS, path), Classification::Preflight);
        }
    }

    #[test]
    fn static_files_are_assets_for_every_method() {
        let paths = [
            "/favicon.ico",
            "/logo.PNG",
            "/static/app",
            "/_next/static/chunks/main.js",
            "/fonts/inter.woff2",
            "/manifest.json",
            "/mcp/icon.svg",
        ];
        for method in [Method::GET, Method::POST, Method::DELETE, Method::HEAD] {
            for path in paths {
                assert_eq!(classify(&method, path), Classification::Asset, "{method} {path}");
            }
        }
    }

    #[test]
    fn machine_endpoints_bypass_sessions() {
        for path in [
            "/mcp",
            "/mcp/sse",
            "/.well-known/oauth-protected-resource",
            "/.well-known/oauth-protected-resource/mcp",
            "/chatgpt",
            "/chatgpt/widget",
        ] {
            assert_eq!(
                classify(&Method::POST, path),
                Classification::MachineAuth,
                "{path}"
            );
        }
    }

    #[test]
    fn everything_else_is_session_gated() {
        for path in [
            "/",
            "/oauth/consent",
            "/api/oauth/decision",
            "/auth/login",
            "/release.v2/notes",
            "/.json",
        ] {
            assert_eq!(
                classify(&Method::GET, path),
                Classification::SessionGated,
                "{path}"
            );
        }
    }
}
