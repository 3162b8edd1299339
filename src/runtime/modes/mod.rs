//! Mode routing
//!
//! `serve` runs the HTTP server; `generate-config` is handled in `main`.

pub mod server;

pub use server::run_server;
