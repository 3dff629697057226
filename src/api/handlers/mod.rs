/*
 * Responsibility
 * - handler の置き場所 (1 ファイル = 1 画面 / 1 endpoint 群)
 */
pub mod consent;
pub mod embedded;
pub mod home;
pub mod mcp;
pub mod oauth;
pub mod session;
pub mod well_known;
