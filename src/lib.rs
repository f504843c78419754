//! # queryset-tools
//!
//! Keyed filters and page slicing for query sets in a web backend.
//!
//! ## Architecture
//!
//! - **domain**: the `QuerySet` capability, lookups, filters and paginators
//! - **infrastructure**: query set backends (in-memory JSON records, SeaORM)
//! - **shared**: error types and pagination DTOs
//! - **config**: TOML configuration for pagination defaults and logging
//!
//! Typical request handling filters first, then paginates:
//!
//! ```ignore
//! let set = apply_filters(&[&active, &email], SeaOrmQuerySet::<user::Entity>::new(db), &params)?;
//! let paginator = QuerySetPaginator::new(set, config.pagination.resolve_per_page(per_page)).await?;
//! let (page, pagination) = paginator.get_page(number);
//! let users = page.all().await?;
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod shared;

pub use config::{default_config_path, AppConfig, PaginationConfig};

pub use domain::{
    apply_filters, Filter, FilterParams, Lookup, LookupOperator, Paginator, QuerySet,
    QuerySetFilter, QuerySetPaginator,
};

pub use infrastructure::{init_database, DatabaseConfig, MemoryQuerySet, SeaOrmQuerySet};

pub use logging::init_tracing;

pub use shared::{AppError, Page, PaginationData, PerPage};
