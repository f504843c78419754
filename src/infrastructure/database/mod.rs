pub mod queryset;

pub use queryset::SeaOrmQuerySet;

use sea_orm::{Database, DatabaseConnection};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// `[database]` section of the config file.
///
/// ```toml
/// [database]
/// url = "sqlite://./records.db?mode=rwc"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; an in-memory SQLite database when omitted
    #[validate(length(min = 1))]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
        }
    }
}

/// Open the connection query sets run against.
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);
    let db = Database::connect(&config.url).await?;
    info!("Database connected");
    Ok(db)
}
