pub mod bearer;
pub mod factory;
pub mod gotrue;
pub mod principal;
pub mod server;
pub mod session;

pub use bearer::BearerVerifier;
pub use factory::build_auth_services;
pub use principal::Principal;
pub use server::{AuthServerError, AuthorizationServer};
pub use session::{CookieSessionStore, SessionCookie, SessionStore};
