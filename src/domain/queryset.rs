//! Query set abstraction
//!
//! A query set is an ordered, sliceable collection of records that can be
//! narrowed by lookups, deduplicated and counted. Backends may be fully
//! materialized (see `infrastructure::memory`) or a deferred database
//! query (see `infrastructure::database`), so only `count` is async.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;

use crate::shared::{FilterError, FilterResult, QueryResult};

/// Comparison applied by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupOperator {
    Exact,
    IExact,
    Contains,
    IContains,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    StartsWith,
    EndsWith,
    IsNull,
}

impl LookupOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::IsNull => "isnull",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(Self::Exact),
            "iexact" => Some(Self::IExact),
            "contains" => Some(Self::Contains),
            "icontains" => Some(Self::IContains),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            "isnull" => Some(Self::IsNull),
            _ => None,
        }
    }
}

impl fmt::Display for LookupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field path plus the comparison to run against it.
///
/// Segments are separated by `.` or `__`, so `"user.email"`,
/// `"user__email"` and `"user__email__exact"` are the same lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lookup {
    path: Vec<String>,
    operator: LookupOperator,
}

impl Lookup {
    pub fn new(path: Vec<String>, operator: LookupOperator) -> FilterResult<Self> {
        if path.is_empty() || path.iter().any(|segment| segment.is_empty()) {
            return Err(FilterError::InvalidLookup(path.join(".")));
        }
        Ok(Self { path, operator })
    }

    pub fn parse(raw: &str) -> FilterResult<Self> {
        let mut segments: Vec<String> = raw
            .split("__")
            .flat_map(|part| part.split('.'))
            .map(str::to_string)
            .collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(FilterError::InvalidLookup(raw.to_string()));
        }

        // A trailing operator only counts when a field precedes it
        let operator = match segments.last().map(|s| LookupOperator::from_str(s)) {
            Some(Some(op)) if segments.len() > 1 => {
                segments.pop();
                op
            }
            _ => LookupOperator::Exact,
        };

        Self::new(segments, operator)
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// First path segment: the field on the record itself.
    pub fn field(&self) -> &str {
        &self.path[0]
    }

    pub fn is_relation(&self) -> bool {
        self.path.len() > 1
    }

    pub fn operator(&self) -> LookupOperator {
        self.operator
    }
}

impl FromStr for Lookup {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lookup::parse(s)
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("."))?;
        if self.operator != LookupOperator::Exact {
            write!(f, "__{}", self.operator)?;
        }
        Ok(())
    }
}

/// Collection capability consumed by filters and paginators.
///
/// `filter`, `distinct` and `slice` build a new query set without touching
/// the receiver's records; only `count` may need to reach the backend.
#[async_trait]
pub trait QuerySet: Sized + Send + Sync {
    /// Narrow the set to records matching `lookup` against `value`.
    fn filter(self, lookup: &Lookup, value: &Value) -> FilterResult<Self>;

    /// Drop duplicate records.
    fn distinct(self) -> Self;

    /// Number of records in the set.
    async fn count(&self) -> QueryResult<u64>;

    /// Records in `[start, end)`. Out-of-range bounds are clamped.
    fn slice(&self, start: u64, end: u64) -> Self;
}

// ── Tests ──────────────────────────────────────────────────────
