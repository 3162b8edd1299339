//! Clickmatch - install attribution service
//!
//! Campaign links, click fingerprint logging and probabilistic
//! install-to-click matching.
//!
//! # Architecture
//! - `matching`: scorer, candidate selection contract and the attribution engine
//! - `storage`: SeaORM backend implementing the fingerprint store
//! - `services`: link / install business logic
//! - `api`: HTTP handlers and routes
//! - `config`: static configuration
//! - `runtime`: startup and server mode
//! - `system`: logging

pub mod api;
pub mod config;
pub mod errors;
pub mod matching;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
