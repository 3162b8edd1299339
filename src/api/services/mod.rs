pub mod health;
pub mod helpers;
pub mod install;
mod landing;
pub mod links;
pub mod redirect;

pub use health::{AppStartTime, HealthService, health_routes};
pub use install::{InstallApi, install_routes};
pub use links::{LinkApi, link_routes};
pub use redirect::{RedirectService, redirect_routes};
