//! Authentication module
//!
//! The integration API authenticates every request with a static access
//! token carried in a custom header. There is no expiry or refresh.

mod authenticator;

pub use authenticator::{TokenAuthenticator, DEFAULT_AUTH_HEADER};
