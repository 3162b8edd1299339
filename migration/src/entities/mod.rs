pub mod click;
pub mod click_claim;
pub mod click_event;
pub mod install;

pub use click::Entity as ClickEntity;
pub use click_claim::Entity as ClickClaimEntity;
pub use click_event::Entity as ClickEventEntity;
pub use install::Entity as InstallEntity;
