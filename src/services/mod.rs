//! Service layer for business logic
//!
//! HTTP handlers delegate here; services own the storage handle and the
//! attribution engine.

mod click_service;
mod install_service;

pub use click_service::*;
pub use install_service::*;
