/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (gateway / bearer / security headers / http 共通層)
 * - axum::serve() で起動
 */
use std::{panic, process};

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::auth::build_auth_services;
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // RUST_LOG があればそれを優先
    // ex: RUST_LOG=info,consent_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing (stderr may be hidden by the launcher).
        tracing::error!(?info, "panic");

        // development: fail fast
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {} (public base {})",
        config.app_env,
        config.addr,
        config.public_base_url
    );

    let addr = config.addr;
    let state = build_state(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_state(config: Config) -> Result<AppState> {
    let auth = build_auth_services(&config).context("building authorization server client")?;
    Ok(AppState::new(config, auth))
}

/// Assemble the full application: routes, static fallback and every layer.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    // The gateway wraps the static fallback too, so assets are classified like everything else.
    let router = api::routes(state.clone()).fallback_service(static_files);
    let router = middleware::gateway::apply(router, state.clone());
    let router = router.with_state(state.clone());
    let router = middleware::security_headers::apply(router);
    let router = middleware::http::apply(router, &state.config);

    // Outermost: responses made by the HTTP layers (408, 413) get CORS too.
    middleware::cors::apply(router, state.cors.clone())
}
