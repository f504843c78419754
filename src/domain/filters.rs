//! Keyed filters
//!
//! A filter is identified by a `key`. Request code collects parameters into
//! a [`FilterParams`] map and hands it to every filter it knows about; each
//! filter picks out its own parameter, or leaves the collection alone when
//! the parameter is absent.

use serde_json::Value;
use tracing::debug;

use super::queryset::{Lookup, QuerySet};
use crate::shared::FilterResult;

/// Parameters keyed by filter key.
pub type FilterParams = serde_json::Map<String, Value>;

/// A named, parameterized predicate over a collection `C`.
pub trait Filter<C> {
    /// Unique identifier used to find this filter's parameter.
    fn key(&self) -> &str;

    /// Build the predicate for `param` and apply it to `objects`.
    fn execute(&self, objects: C, param: &Value) -> FilterResult<C>;

    fn apply(&self, objects: C, param: &Value) -> FilterResult<C> {
        self.execute(objects, param)
    }

    /// Apply with the parameter stored under [`Filter::key`] in `params`.
    ///
    /// A missing key is not an error: `objects` is returned as is.
    fn apply_dict_params(&self, objects: C, params: &FilterParams) -> FilterResult<C> {
        match params.get(self.key()) {
            Some(param) => self.apply(objects, param),
            None => Ok(objects),
        }
    }
}

/// Filter that narrows a query set with a single `{lookup: param}` predicate.
///
/// # Example
/// ```ignore
/// let active = QuerySetFilter::new("active", "is_active")?;
/// let users = active.apply_dict_params(users, &params)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySetFilter {
    key: String,
    lookup: Lookup,
}

impl QuerySetFilter {
    pub fn new(key: impl Into<String>, lookup: &str) -> FilterResult<Self> {
        Ok(Self {
            key: key.into(),
            lookup: Lookup::parse(lookup)?,
        })
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }
}

impl<Q: QuerySet> Filter<Q> for QuerySetFilter {
    fn key(&self) -> &str {
        &self.key
    }

    fn execute(&self, queryset: Q, param: &Value) -> FilterResult<Q> {
        debug!(key = %self.key, lookup = %self.lookup, "Applying query set filter");
        queryset.filter(&self.lookup, param)
    }
}

/// Run `objects` through every filter in order, each picking its own
/// parameter from `params`.
pub fn apply_filters<C>(
    filters: &[&dyn Filter<C>],
    objects: C,
    params: &FilterParams,
) -> FilterResult<C> {
    filters
        .iter()
        .try_fold(objects, |objects, filter| filter.apply_dict_params(objects, params))
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::MemoryQuerySet;
    use crate::shared::FilterError;
    use serde_json::json;

    /// Filter over plain integer vectors, for exercising the provided methods.
    struct MinimumFilter;

    impl Filter<Vec<i64>> for MinimumFilter {
        fn key(&self) -> &str {
            "min"
        }

        fn execute(&self, objects: Vec<i64>, param: &Value) -> FilterResult<Vec<i64>> {
            let min = param
                .as_i64()
                .ok_or_else(|| FilterError::invalid_value("min", "expected an integer"))?;
            Ok(objects.into_iter().filter(|n| *n >= min).collect())
        }
    }

    fn params(value: Value) -> FilterParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    fn users() -> MemoryQuerySet {
        MemoryQuerySet::new(vec![
            json!({"id": 1, "is_active": true, "user": {"email": "a@example.com"}}),
            json!({"id": 2, "is_active": false, "user": {"email": "b@example.com"}}),
            json!({"id": 3, "is_active": true, "user": {"email": "c@example.com"}}),
        ])
    }

    fn ids(set: &MemoryQuerySet) -> Vec<i64> {
        set.records().iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    #[test]
    fn apply_runs_execute_unconditionally() {
        let out = MinimumFilter.apply(vec![1, 5, 10], &json!(5)).unwrap();
        assert_eq!(out, vec![5, 10]);
    }

    #[test]
    fn apply_dict_params_uses_matching_key() {
        let out = MinimumFilter
            .apply_dict_params(vec![1, 5, 10], &params(json!({"min": 6})))
            .unwrap();
        assert_eq!(out, vec![10]);
    }

    #[test]
    fn apply_dict_params_without_key_returns_input() {
        let out = MinimumFilter
            .apply_dict_params(vec![1, 5, 10], &params(json!({"other": 6})))
            .unwrap();
        assert_eq!(out, vec![1, 5, 10]);
    }

    #[test]
    fn execute_errors_propagate() {
        let err = MinimumFilter.apply(vec![1], &json!("five")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn queryset_filter_builds_lookup_predicate() {
        let active = QuerySetFilter::new("active", "is_active").unwrap();
        let out = active
            .apply_dict_params(users(), &params(json!({"active": true})))
            .unwrap();
        assert_eq!(ids(&out), vec![1, 3]);
    }

    #[test]
    fn queryset_filter_is_noop_for_missing_key() {
        let active = QuerySetFilter::new("active", "is_active").unwrap();
        let out = active.apply_dict_params(users(), &FilterParams::new()).unwrap();
        assert_eq!(out, users());
    }

    #[test]
    fn queryset_filter_follows_relation_path() {
        let email = QuerySetFilter::new("email", "user.email").unwrap();
        let out = email.apply(users(), &json!("b@example.com")).unwrap();
        assert_eq!(ids(&out), vec![2]);
    }

    #[test]
    fn queryset_filter_surfaces_unknown_field() {
        let bogus = QuerySetFilter::new("bogus", "no_such_field").unwrap();
        let err = bogus.apply(users(), &json!(1)).unwrap_err();
        assert!(matches!(err, FilterError::UnknownField { .. }));
    }

    #[test]
    fn invalid_lookup_is_rejected_at_construction() {
        assert!(QuerySetFilter::new("bad", "user..email").is_err());
    }

    #[test]
    fn apply_filters_chains_present_keys_only() {
        let active = QuerySetFilter::new("active", "is_active").unwrap();
        let min_id = QuerySetFilter::new("min_id", "id__gte").unwrap();
        let email = QuerySetFilter::new("email", "user.email").unwrap();
        let filters: [&dyn Filter<MemoryQuerySet>; 3] = [&active, &min_id, &email];

        let out = apply_filters(&filters, users(), &params(json!({"active": true, "min_id": 2})))
            .unwrap();
        assert_eq!(ids(&out), vec![3]);
    }
}
