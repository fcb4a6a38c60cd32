//! HTTP middleware: security headers and env-driven CORS.

pub mod cors;
pub mod security;

pub use cors::cors_layer_from_env;
pub use security::security_headers;
