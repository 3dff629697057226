/*
 * Responsibility
 * - crate の module 構成
 * - binary (main.rs) は app::run() を呼ぶだけ
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_utils;
