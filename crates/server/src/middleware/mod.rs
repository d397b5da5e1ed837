//! HTTP middleware: session layer and auth extractors.

pub mod auth;
pub mod session;

pub use session::create_session_layer;
