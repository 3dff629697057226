/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - config, 認可サーバ連携 (session / bearer), CORS policy
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::config::Config;
use crate::middleware::cors::CorsPolicy;
use crate::services::auth::factory::AuthServices;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthServices,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    pub fn new(config: Config, auth: AuthServices) -> Self {
        let cors = CorsPolicy::from_config(&config);
        Self {
            config: Arc::new(config),
            auth,
            cors: Arc::new(cors),
        }
    }
}
