/*
 * Responsibility
 * - 認証 gate の公開インターフェース
 *   - bearer: machine-auth (tool endpoint) 用
 *   - session: cookie session 用 (gateway から呼ばれる)
 */
pub mod bearer;
pub mod session;
