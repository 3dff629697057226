/*
 * Responsibility
 * - HTTP 入出力の型 (serde)
 * - ドメイン型 (services) とは分けておく
 */
pub mod decision;
pub mod mcp;
pub mod session;
