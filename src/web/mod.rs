//! HTTP surface over the tools factory
//!
//! # Modules
//!
//! - [`routes`]: Router, redirects and status mapping
//! - [`render`]: Plain-text rendering of operation outcomes
//! - [`server`]: Binding and serving the router

pub mod render;
pub mod routes;
pub mod server;

pub use routes::router;
pub use server::serve;
