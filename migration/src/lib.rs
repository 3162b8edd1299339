pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_clicks;
mod m20260301_000002_click_events;
mod m20260301_000003_installs;
mod m20260302_000001_click_claims;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_clicks::Migration),
            Box::new(m20260301_000002_click_events::Migration),
            Box::new(m20260301_000003_installs::Migration),
            Box::new(m20260302_000001_click_claims::Migration),
        ]
    }
}
