//! In-memory query set over JSON records
//!
//! Records are `serde_json::Value` objects. Lookup paths walk nested
//! objects; arrays along the path fan out, so a record matches when any
//! related value matches. A `null` relation yields nothing to compare,
//! which only `isnull=true` accepts.

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use log::debug;
use serde_json::{Number, Value};

use crate::domain::{Lookup, LookupOperator, QuerySet};
use crate::shared::{FilterError, FilterResult, QueryResult};

/// In-memory query set for development, tests and small datasets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryQuerySet {
    records: Vec<Value>,
}

impl MemoryQuerySet {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Value> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Value>> for MemoryQuerySet {
    fn from(records: Vec<Value>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<Value> for MemoryQuerySet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ── Lookup evaluation ───────────────────────────────────────────

/// Values reached by following `path` from `record`.
fn resolve<'a>(record: &'a Value, path: &[String], lookup: &Lookup) -> FilterResult<Vec<&'a Value>> {
    let mut current = vec![record];

    for segment in path {
        let mut next = Vec::with_capacity(current.len());
        for value in current {
            match value {
                Value::Object(map) => match map.get(segment) {
                    Some(child) => next.push(child),
                    None => {
                        return Err(FilterError::UnknownField {
                            field: segment.clone(),
                            lookup: lookup.to_string(),
                        })
                    }
                },
                Value::Array(items) => {
                    for item in items {
                        next.extend(resolve(item, std::slice::from_ref(segment), lookup)?);
                    }
                }
                Value::Null => {}
                _ => {
                    return Err(FilterError::UnsupportedLookup(format!(
                        "{} (cannot traverse into a scalar at {:?})",
                        lookup, segment
                    )))
                }
            }
        }
        current = next;
    }

    // A to-many relation at the end of the path compares its members
    Ok(current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        })
        .collect())
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Integers compare exactly; floats only when either side is one.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (as_integer(a), as_integer(b)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn string_test(value: &Value, needle: &str, test: impl Fn(&str, &str) -> bool) -> bool {
    value.as_str().is_some_and(|s| test(s, needle))
}

/// Check `param` against what `operator` accepts before touching records.
fn validate_param(lookup: &Lookup, param: &Value) -> FilterResult<()> {
    use LookupOperator::*;

    match lookup.operator() {
        Exact => Ok(()),
        IExact | Contains | IContains | StartsWith | EndsWith if param.is_string() => Ok(()),
        IExact | Contains | IContains | StartsWith | EndsWith => {
            Err(FilterError::invalid_value(lookup, "expected a string"))
        }
        Gt | Gte | Lt | Lte if param.is_number() || param.is_string() || param.is_boolean() => Ok(()),
        Gt | Gte | Lt | Lte => Err(FilterError::invalid_value(
            lookup,
            "expected a number, string or boolean",
        )),
        In if param.is_array() => Ok(()),
        In => Err(FilterError::invalid_value(lookup, "expected an array")),
        IsNull if param.is_boolean() => Ok(()),
        IsNull => Err(FilterError::invalid_value(lookup, "expected a boolean")),
    }
}

fn is_match(candidates: &[&Value], operator: LookupOperator, param: &Value) -> bool {
    use LookupOperator::*;

    if operator == IsNull {
        let want_null = param.as_bool().unwrap_or(false);
        let is_null = candidates.is_empty() || candidates.iter().any(|v| v.is_null());
        return is_null == want_null;
    }

    let needle = param.as_str().unwrap_or_default();
    let lowered = needle.to_lowercase();

    candidates.iter().any(|value| match operator {
        Exact => values_equal(value, param),
        IExact => string_test(value, &lowered, |s, n| s.to_lowercase() == n),
        Contains => string_test(value, needle, |s, n| s.contains(n)),
        IContains => string_test(value, &lowered, |s, n| s.to_lowercase().contains(n)),
        StartsWith => string_test(value, needle, |s, n| s.starts_with(n)),
        EndsWith => string_test(value, needle, |s, n| s.ends_with(n)),
        Gt => compare(value, param) == Some(Ordering::Greater),
        Gte => matches!(compare(value, param), Some(Ordering::Greater | Ordering::Equal)),
        Lt => compare(value, param) == Some(Ordering::Less),
        Lte => matches!(compare(value, param), Some(Ordering::Less | Ordering::Equal)),
        In => param
            .as_array()
            .is_some_and(|options| options.iter().any(|option| values_equal(value, option))),
        IsNull => unreachable!(),
    })
}

// ── QuerySet impl ───────────────────────────────────────────────

#[async_trait]
impl QuerySet for MemoryQuerySet {
    fn filter(self, lookup: &Lookup, value: &Value) -> FilterResult<Self> {
        validate_param(lookup, value)?;

        let mut kept = Vec::with_capacity(self.records.len());
        for record in self.records {
            let candidates = resolve(&record, lookup.path(), lookup)?;
            if is_match(&candidates, lookup.operator(), value) {
                kept.push(record);
            }
        }

        debug!("Filter {} = {} kept {} records", lookup, value, kept.len());
        Ok(Self::new(kept))
    }

    fn distinct(self) -> Self {
        // Object keys serialize in sorted order, so equal records render equally
        let mut seen = HashSet::new();
        let records = self
            .records
            .into_iter()
            .filter(|record| seen.insert(record.to_string()))
            .collect();
        Self::new(records)
    }

    async fn count(&self) -> QueryResult<u64> {
        Ok(self.records.len() as u64)
    }

    fn slice(&self, start: u64, end: u64) -> Self {
        let len = self.records.len();
        let start = usize::try_from(start).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(end).unwrap_or(usize::MAX).clamp(start, len);
        Self::new(self.records[start..end].to_vec())
    }
}

// ── Tests ──────────────────────────────────────────────────────
