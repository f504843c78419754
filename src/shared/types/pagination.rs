use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::PaginationError;

/// Message attached to the metadata of an out-of-range page.
pub const INVALID_PAGE_ERROR: &str = "Page data is invalid";

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u64 = 100;

/// Requested page size.
///
/// `-1` on the wire means "everything on one page".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PerPage {
    Limited(NonZeroU64),
    Unlimited,
}

impl PerPage {
    pub const UNLIMITED_SENTINEL: i64 = -1;

    pub fn limited(per_page: u64) -> Result<Self, PaginationError> {
        NonZeroU64::new(per_page)
            .map(PerPage::Limited)
            .ok_or(PaginationError::InvalidPerPage(0))
    }

    /// Page size for a collection of `objects_count` items.
    pub fn resolve(self, objects_count: u64) -> u64 {
        match self {
            PerPage::Limited(n) => n.get(),
            PerPage::Unlimited => objects_count,
        }
    }
}

impl Default for PerPage {
    fn default() -> Self {
        PerPage::Limited(NonZeroU64::new(DEFAULT_PER_PAGE).unwrap_or(NonZeroU64::MIN))
    }
}

impl TryFrom<i64> for PerPage {
    type Error = PaginationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == Self::UNLIMITED_SENTINEL {
            return Ok(PerPage::Unlimited);
        }
        u64::try_from(value)
            .ok()
            .and_then(NonZeroU64::new)
            .map(PerPage::Limited)
            .ok_or(PaginationError::InvalidPerPage(value))
    }
}

impl From<PerPage> for i64 {
    fn from(per_page: PerPage) -> Self {
        match per_page {
            PerPage::Limited(n) => i64::try_from(n.get()).unwrap_or(i64::MAX),
            PerPage::Unlimited => PerPage::UNLIMITED_SENTINEL,
        }
    }
}

impl fmt::Display for PerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerPage::Limited(n) => write!(f, "{}", n),
            PerPage::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Metadata returned alongside every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationData {
    /// Number of objects in the whole collection
    pub objects_count: u64,
    /// Requested page number, echoed back as given
    pub page_number: i64,
    /// Total number of pages
    pub page_count: u64,
    /// Resolved page size
    pub per_page: u64,
    /// Present only when the requested page was invalid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl PaginationData {
    pub fn is_valid(&self) -> bool {
        self.errors.is_none()
    }
}

/// Serializable page: the sliced objects plus their pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub objects: Vec<T>,
    pub pagination: PaginationData,
}

impl<T> Page<T> {
    pub fn new(objects: Vec<T>, pagination: PaginationData) -> Self {
        Self {
            objects,
            pagination,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
