//! Infrastructure layer - query set backends

pub mod database;
pub mod memory;

pub use database::{init_database, DatabaseConfig, SeaOrmQuerySet};
pub use memory::MemoryQuerySet;
