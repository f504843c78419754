use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid lookup: {0:?}")]
    InvalidLookup(String),

    #[error("Unknown field: {field} in lookup {lookup}")]
    UnknownField { field: String, lookup: String },

    #[error("Unsupported lookup: {0}")]
    UnsupportedLookup(String),

    #[error("Invalid value for {lookup}: {reason}")]
    InvalidValue { lookup: String, reason: String },

    #[error("Cannot filter a query set once a slice has been taken")]
    FilterAfterSlice,
}

impl FilterError {
    pub fn invalid_value(lookup: impl ToString, reason: impl Into<String>) -> Self {
        FilterError::InvalidValue {
            lookup: lookup.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid per_page: {0} (expected -1 or a positive number)")]
    InvalidPerPage(i64),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type FilterResult<T> = Result<T, FilterError>;
pub type QueryResult<T> = Result<T, QueryError>;
