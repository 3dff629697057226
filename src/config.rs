/*
 * Responsibility
 * - 環境変数や設定の読み込み (公開 URL, 認可サーバ, Cookie, CORS 許可など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 起動時に一度だけ解決し、AppState 経由で各コンポーネントへ明示的に渡す
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Absolute origin this app is served from, without a trailing slash.
    pub public_base_url: String,
    pub cors_allowed_origins: Vec<String>,

    // GoTrue-compatible authorization server (e.g. https://<project>.supabase.co/auth/v1)
    pub auth_server_url: String,
    pub auth_anon_key: String,
    pub auth_server_timeout: Duration,

    pub session_cookie_name: String,
    pub session_cookie_max_age_seconds: u64,
    pub session_refresh_margin_seconds: i64,

    pub static_dir: PathBuf,
    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the anon key
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("public_base_url", &self.public_base_url)
            .field("auth_server_url", &self.auth_server_url)
            .field("session_cookie_name", &self.session_cookie_name)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(&lookup("APP_ENV").unwrap_or_else(|| "development".into()));

        let public_base_url = resolve_public_base_url(app_env, port, &lookup)?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let project_id = non_empty(lookup("SUPABASE_PROJECT_ID"));

        let auth_server_url = match non_empty(lookup("AUTH_SERVER_URL")) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let project = project_id
                    .as_deref()
                    .ok_or(ConfigError::Missing("AUTH_SERVER_URL"))?;
                format!("https://{}.supabase.co/auth/v1", project)
            }
        };
        url::Url::parse(&auth_server_url).map_err(|_| ConfigError::Invalid("AUTH_SERVER_URL"))?;

        let auth_anon_key = non_empty(lookup("SUPABASE_ANON_KEY"))
            .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let auth_server_timeout = Duration::from_millis(
            lookup("AUTH_SERVER_TIMEOUT_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5_000),
        );

        let session_cookie_name = non_empty(lookup("SESSION_COOKIE_NAME")).unwrap_or_else(|| {
            match &project_id {
                Some(project) => format!("sb-{}-auth-token", project),
                None => "sb-auth-token".to_string(),
            }
        });

        let session_cookie_max_age_seconds = lookup("SESSION_COOKIE_MAX_AGE_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(400 * 24 * 60 * 60);

        let session_refresh_margin_seconds = lookup("SESSION_REFRESH_MARGIN_SECONDS")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);

        let static_dir = PathBuf::from(lookup("STATIC_DIR").unwrap_or_else(|| "public".into()));

        let request_timeout = Duration::from_secs(
            lookup("REQUEST_TIMEOUT_SECONDS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        );

        let request_body_limit_bytes = lookup("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            public_base_url,
            cors_allowed_origins,
            auth_server_url,
            auth_anon_key,
            auth_server_timeout,
            session_cookie_name,
            session_cookie_max_age_seconds,
            session_refresh_margin_seconds,
            static_dir,
            request_timeout,
            request_body_limit_bytes,
        })
    }

    /// Cookies are only marked `Secure` when served over https.
    pub fn secure_cookies(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

/// Pick the public origin of this deployment.
///
/// Order: explicit `PUBLIC_BASE_URL`, localhost in development, then the
/// hosting platform's production / branch / deployment host names.
fn resolve_public_base_url<F>(app_env: AppEnv, port: u16, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(lookup("PUBLIC_BASE_URL")) {
        return Ok(with_scheme(&url));
    }

    if !app_env.is_production() {
        return Ok(format!("http://localhost:{}", port));
    }

    let host = if lookup("VERCEL_ENV").as_deref() == Some("production") {
        non_empty(lookup("VERCEL_PROJECT_PRODUCTION_URL"))
    } else {
        non_empty(lookup("VERCEL_BRANCH_URL")).or_else(|| non_empty(lookup("VERCEL_URL")))
    };

    host.map(|h| with_scheme(&h))
        .ok_or(ConfigError::Missing("PUBLIC_BASE_URL"))
}

// Host names may be given bare ("app.example.com") or as full URLs.
fn with_scheme(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
