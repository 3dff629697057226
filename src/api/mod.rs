/*
 * Responsibility
 * - HTTP 層の公開ポイント (routes() の re-export など)
 * - handler / extractor / dto / 小さな response helper
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod html;
pub mod redirect;
mod routes;

pub use routes::routes;
