pub mod auth;
pub mod bridge;
pub mod routing;
pub mod tools;
