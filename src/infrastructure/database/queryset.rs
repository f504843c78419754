//! SeaORM implementation of QuerySet
//!
//! Wraps a `Select<E>` and only reaches the database on `count` and `all`.
//! Lookups address a single column by name; relation paths are rejected.
//!
//! `iexact` and `icontains` compare against `LOWER(column)`. SQLite's `LOWER`
//! only folds ASCII letters, so non-ASCII text matches case-sensitively there
//! while the in-memory backend folds full Unicode.

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, QueryTrait, Select, Statement,
};
use serde_json::Value;

use crate::domain::{Lookup, LookupOperator, QuerySet};
use crate::shared::{FilterError, FilterResult, QueryResult};

/// Offset/limit range recorded by `slice`, applied when the query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: u64,
    end: u64,
}

impl Window {
    fn len(&self) -> u64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone)]
pub struct SeaOrmQuerySet<E: EntityTrait> {
    select: Select<E>,
    db: DatabaseConnection,
    window: Option<Window>,
}

impl<E: EntityTrait> SeaOrmQuerySet<E> {
    /// Query set over every row of `E`.
    pub fn new(db: DatabaseConnection) -> Self {
        Self::from_select(db, E::find())
    }

    pub fn from_select(db: DatabaseConnection, select: Select<E>) -> Self {
        Self {
            select,
            db,
            window: None,
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The select with any slice window applied.
    pub fn select(&self) -> Select<E> {
        match self.window {
            Some(window) => self
                .select
                .clone()
                .offset(window.start)
                .limit(window.len()),
            None => self.select.clone(),
        }
    }

    /// SQL for this query set on `backend`.
    pub fn build(&self, backend: DbBackend) -> Statement {
        self.select().build(backend)
    }

    /// Run the query and load its models.
    pub async fn all(&self) -> QueryResult<Vec<E::Model>>
    where
        E::Model: Sync,
    {
        Ok(self.select().all(&self.db).await?)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn db_value(lookup: &Lookup, param: &Value) -> FilterResult<sea_orm::Value> {
    match param {
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into())
            } else if let Some(u) = n.as_u64() {
                Ok(u.into())
            } else {
                n.as_f64()
                    .map(Into::into)
                    .ok_or_else(|| FilterError::invalid_value(lookup, "unrepresentable number"))
            }
        }
        Value::String(s) => Ok(s.clone().into()),
        Value::Null => Err(FilterError::invalid_value(lookup, "null is only allowed with exact")),
        Value::Array(_) | Value::Object(_) => {
            Err(FilterError::invalid_value(lookup, "expected a scalar value"))
        }
    }
}

fn expect_str<'a>(lookup: &Lookup, param: &'a Value) -> FilterResult<&'a str> {
    param
        .as_str()
        .ok_or_else(|| FilterError::invalid_value(lookup, "expected a string"))
}

/// `%` and `_` in `needle` match literally.
fn like_pattern(prefix: &str, needle: &str, suffix: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push_str(prefix);
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push_str(suffix);
    LikeExpr::new(pattern).escape('\\')
}

fn lower<C: ColumnTrait>(column: C) -> Expr {
    Expr::expr(Func::lower(Expr::col((column.entity_name(), column))))
}

fn condition<C: ColumnTrait>(column: C, lookup: &Lookup, param: &Value) -> FilterResult<SimpleExpr> {
    use LookupOperator::*;

    let expr = match lookup.operator() {
        Exact if param.is_null() => column.is_null(),
        Exact => column.eq(db_value(lookup, param)?),
        IExact => lower(column).eq(expect_str(lookup, param)?.to_lowercase()),
        Contains => column.like(like_pattern("%", expect_str(lookup, param)?, "%")),
        IContains => {
            let needle = expect_str(lookup, param)?.to_lowercase();
            lower(column).like(like_pattern("%", &needle, "%"))
        }
        StartsWith => column.like(like_pattern("", expect_str(lookup, param)?, "%")),
        EndsWith => column.like(like_pattern("%", expect_str(lookup, param)?, "")),
        Gt => column.gt(db_value(lookup, param)?),
        Gte => column.gte(db_value(lookup, param)?),
        Lt => column.lt(db_value(lookup, param)?),
        Lte => column.lte(db_value(lookup, param)?),
        In => {
            let values = param
                .as_array()
                .ok_or_else(|| FilterError::invalid_value(lookup, "expected an array"))?
                .iter()
                .map(|v| db_value(lookup, v))
                .collect::<FilterResult<Vec<_>>>()?;
            column.is_in(values)
        }
        IsNull => match param.as_bool() {
            Some(true) => column.is_null(),
            Some(false) => column.is_not_null(),
            None => return Err(FilterError::invalid_value(lookup, "expected a boolean")),
        },
    };
    Ok(expr)
}

// ── QuerySet impl ───────────────────────────────────────────────

#[async_trait]
impl<E> QuerySet for SeaOrmQuerySet<E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    fn filter(self, lookup: &Lookup, value: &Value) -> FilterResult<Self> {
        if self.window.is_some() {
            return Err(FilterError::FilterAfterSlice);
        }
        if lookup.is_relation() {
            return Err(FilterError::UnsupportedLookup(format!(
                "{} (relation paths are not supported on {})",
                lookup,
                E::default().table_name()
            )));
        }

        let column: E::Column = lookup.field().parse().map_err(|_| FilterError::UnknownField {
            field: lookup.field().to_string(),
            lookup: lookup.to_string(),
        })?;
        let expr = condition(column, lookup, value)?;

        debug!("Filtering {} by {} = {}", E::default().table_name(), lookup, value);
        Ok(Self {
            select: self.select.filter(expr),
            db: self.db,
            window: None,
        })
    }

    fn distinct(self) -> Self {
        Self {
            select: self.select.distinct(),
            ..self
        }
    }

    async fn count(&self) -> QueryResult<u64> {
        let total = self.select.clone().count(&self.db).await?;
        Ok(match self.window {
            Some(window) => total.saturating_sub(window.start).min(window.len()),
            None => total,
        })
    }

    fn slice(&self, start: u64, end: u64) -> Self {
        let end = end.max(start);
        let window = match self.window {
            Some(outer) => Window {
                start: outer.start.saturating_add(start).min(outer.end),
                end: outer.start.saturating_add(end).min(outer.end),
            },
            None => Window { start, end },
        };
        Self {
            select: self.select.clone(),
            db: self.db.clone(),
            window: Some(window),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod post {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "posts")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub title: String,
            pub is_published: bool,
            pub views: i32,
            pub category: Option<String>,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    fn posts() -> SeaOrmQuerySet<post::Entity> {
        SeaOrmQuerySet::new(DatabaseConnection::Disconnected)
    }

    fn sql_for(raw_lookup: &str, value: Value) -> String {
        let lookup = Lookup::parse(raw_lookup).unwrap();
        posts()
            .filter(&lookup, &value)
            .unwrap()
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn exact_builds_equality() {
        let sql = sql_for("views", json!(10));
        assert!(sql.contains(r#""posts"."views" = 10"#), "{sql}");
    }

    #[test]
    fn exact_null_builds_is_null() {
        let sql = sql_for("category", Value::Null);
        assert!(sql.contains(r#""posts"."category" IS NULL"#), "{sql}");
    }

    #[test]
    fn contains_builds_like() {
        let sql = sql_for("title__contains", json!("rust"));
        assert!(sql.contains("LIKE '%rust%'"), "{sql}");
    }

    #[test]
    fn like_wildcards_in_values_are_escaped() {
        let sql = sql_for("title__contains", json!("50%_off"));
        assert!(sql.contains(r"LIKE '%50\%\_off%' ESCAPE '\'"), "{sql}");
        let sql = sql_for("title__startswith", json!("a_b"));
        assert!(sql.contains(r"LIKE 'a\_b%' ESCAPE '\'"), "{sql}");
    }

    #[test]
    fn case_insensitive_pattern_is_folded() {
        let sql = sql_for("title__iexact", json!("ÉTÉ"));
        assert!(sql.contains("= 'été'"), "{sql}");
    }

    #[test]
    fn icontains_lowers_column_and_pattern() {
        let sql = sql_for("title__icontains", json!("Rust"));
        assert!(sql.contains(r#"LOWER("posts"."title")"#), "{sql}");
        assert!(sql.contains("'%rust%'"), "{sql}");
    }

    #[test]
    fn in_and_isnull() {
        let sql = sql_for("id__in", json!([1, 2]));
        assert!(sql.contains(r#""posts"."id" IN (1, 2)"#), "{sql}");
        let sql = sql_for("category__isnull", json!(false));
        assert!(sql.contains(r#""posts"."category" IS NOT NULL"#), "{sql}");
    }

    #[test]
    fn unknown_column_is_an_error() {
        let lookup = Lookup::parse("author").unwrap();
        let err = posts().filter(&lookup, &json!("x")).unwrap_err();
        assert!(matches!(err, FilterError::UnknownField { .. }));
    }

    #[test]
    fn relation_lookup_is_unsupported() {
        let lookup = Lookup::parse("author.email").unwrap();
        let err = posts().filter(&lookup, &json!("x")).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedLookup(_)));
    }

    #[test]
    fn bad_values_are_rejected() {
        let lookup = Lookup::parse("views__gt").unwrap();
        assert!(posts().filter(&lookup, &json!({"n": 1})).is_err());
        let lookup = Lookup::parse("title__startswith").unwrap();
        assert!(posts().filter(&lookup, &json!(3)).is_err());
    }

    #[test]
    fn distinct_and_slice_shape_the_query() {
        let sql = posts()
            .distinct()
            .slice(4, 6)
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.starts_with("SELECT DISTINCT"), "{sql}");
        assert!(sql.contains("LIMIT 2 OFFSET 4"), "{sql}");
    }

    #[test]
    fn nested_slices_stay_inside_the_outer_window() {
        let sql = posts().slice(10, 20).slice(5, 50).build(DbBackend::Sqlite).to_string();
        assert!(sql.contains("LIMIT 5 OFFSET 15"), "{sql}");
    }

    #[test]
    fn filter_after_slice_is_rejected() {
        let lookup = Lookup::parse("views").unwrap();
        let err = posts().slice(0, 10).filter(&lookup, &json!(1)).unwrap_err();
        assert!(matches!(err, FilterError::FilterAfterSlice));
    }
}
