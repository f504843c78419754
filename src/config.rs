//! Configuration module
//!
//! Reads `config.toml` from the user config directory
//! (`~/.config/queryset-tools/config.toml` on Linux) unless
//! `QUERYSET_TOOLS_CONFIG` points elsewhere.
//!
//! ```toml
//! [pagination]
//! default_per_page = 100   # -1 puts everything on one page
//! max_per_page = 1000
//!
//! [logging]
//! level = "info"
//!
//! [database]
//! url = "sqlite::memory:"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use crate::infrastructure::DatabaseConfig;
use crate::shared::{ConfigError, PerPage, DEFAULT_PER_PAGE};

/// Pagination defaults
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size when the request does not carry one (-1 for unlimited)
    #[validate(custom(function = "validate_per_page"))]
    pub default_per_page: i64,
    /// Upper bound for a requested page size
    #[validate(range(min = 1, max = 100000))]
    pub max_per_page: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE as i64,
            max_per_page: 1000,
        }
    }
}

fn validate_per_page(value: i64) -> Result<(), ValidationError> {
    PerPage::try_from(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("per_page"))
}

impl PaginationConfig {
    pub fn default_per_page(&self) -> PerPage {
        PerPage::try_from(self.default_per_page).unwrap_or_default()
    }

    /// Page size for a request, falling back to the default and capping
    /// limited sizes at `max_per_page`. `Unlimited` is passed through.
    pub fn resolve_per_page(&self, requested: Option<PerPage>) -> PerPage {
        match requested.unwrap_or_else(|| self.default_per_page()) {
            PerPage::Limited(n) if n.get() > self.max_per_page => {
                debug!("Capping per_page {} at {}", n, self.max_per_page);
                PerPage::limited(self.max_per_page).unwrap_or_default()
            }
            other => other,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    #[validate(length(min = 1))]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub pagination: PaginationConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load and validate the config at `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }
}

/// `<config dir>/queryset-tools/config.toml`, or `./config.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("queryset-tools"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.pagination.default_per_page, 100);
        assert_eq!(config.pagination.max_per_page, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml("[pagination]\ndefault_per_page = -1\n").unwrap();
        assert_eq!(config.pagination.default_per_page(), PerPage::Unlimited);
        assert_eq!(config.pagination.max_per_page, 1000);
    }

    #[test]
    fn invalid_default_per_page_is_rejected() {
        let err = AppConfig::from_toml("[pagination]\ndefault_per_page = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn default_per_page_below_sentinel_is_rejected() {
        let err = AppConfig::from_toml("[pagination]\ndefault_per_page = -2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let config = AppConfig::from_toml("[pagination]\ndefault_per_page = 25\n").unwrap();
        assert_eq!(config.pagination.default_per_page(), PerPage::limited(25).unwrap());
    }

    #[test]
    fn database_section_is_read_and_validated() {
        assert_eq!(AppConfig::default().database.url, "sqlite::memory:");
        let config = AppConfig::from_toml("[database]\nurl = \"sqlite://./records.db?mode=rwc\"\n").unwrap();
        assert_eq!(config.database.url, "sqlite://./records.db?mode=rwc");
        let err = AppConfig::from_toml("[database]\nurl = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_max_per_page_is_rejected() {
        let err = AppConfig::from_toml("[pagination]\nmax_per_page = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml("[pagination\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn resolve_per_page_caps_and_falls_back() {
        let config = PaginationConfig {
            default_per_page: 20,
            max_per_page: 50,
        };
        assert_eq!(config.resolve_per_page(None), PerPage::limited(20).unwrap());
        assert_eq!(
            config.resolve_per_page(Some(PerPage::limited(500).unwrap())),
            PerPage::limited(50).unwrap()
        );
        assert_eq!(config.resolve_per_page(Some(PerPage::Unlimited)), PerPage::Unlimited);
    }

    #[test]
    fn load_reads_file_and_tolerates_missing_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(AppConfig::load(&path).unwrap().pagination.max_per_page, 1000);

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().logging.level, "debug");
    }
}
