/*
 * Responsibility
 * - middleware の公開インターフェース
 * - gateway (分類 + CORS + session gate), bearer gate, http 共通層, security headers
 */
pub mod auth;
pub mod cors;
pub mod gateway;
pub mod http;
pub mod security_headers;
