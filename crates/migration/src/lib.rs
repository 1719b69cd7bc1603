pub use sea_orm_migration::prelude::*;

mod m20250901_090000_users;
mod m20250901_091000_participants;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_090000_users::Migration),
            Box::new(m20250901_091000_participants::Migration),
        ]
    }
}
