pub mod config;
pub mod database_error;
pub mod database_migration;
pub mod driven;
pub mod driver;

pub use config::InventoryConfig;
pub use database_migration::DatabaseMigration;
