//! Generic filter-to-query translator shared by every list operation.
//!
//! Each entity describes its list query declaratively:
//!
//! - [`ListQuery`] names the projection (joined columns aliased), the `FROM`
//!   clause with its inner join, and the sort order.
//! - [`ListFilter`] turns the entity's sparse filter struct into an ordered
//!   list of [`Predicate`]s with [`Predicates`], one builder call per field.
//!
//! [`fetch_page`] then runs the same algorithm for everyone:
//!
//! 1. count the rows matching the predicates,
//! 2. derive and validate the page boundaries,
//! 3. rebuild the query from scratch with `LIMIT`/`OFFSET` and bind the rows,
//! 4. record how many rows came back.
//!
//! Predicates are pure `AND` composition. An empty set or an unset option
//! contributes nothing, so a default filter behaves exactly like no filter.

use crate::db::errors::{DbError, Result};
use crate::db::pagination::{Paginated, Pagination};
use crate::db::settings::{QuerySettings, bounded};
use crate::types::Entity;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

/// A bound value carried by a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    BigInt(i64),
    BigInts(Vec<i64>),
    Text(String),
    Texts(Vec<String>),
    Bool(bool),
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::BigInt(value)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(values: Vec<i64>) -> Self {
        FilterValue::BigInts(values)
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Texts(values)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKind {
    /// `column = ANY($n)`
    In(FilterValue),
    /// `column = $n`
    Eq(FilterValue),
    /// `column IS NULL` when true, `column IS NOT NULL` when false
    IsNull(bool),
}

/// One condition contributed by a non-empty filter field
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub kind: PredicateKind,
}

/// Ordered predicate builder; skips every empty input.
#[derive(Debug, Default)]
pub struct Predicates(Vec<Predicate>);

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership in `values`, skipped when `values` is empty
    pub fn any<T>(mut self, column: &'static str, values: &[T]) -> Self
    where
        T: Clone,
        Vec<T>: Into<FilterValue>,
    {
        if !values.is_empty() {
            self.0.push(Predicate {
                column,
                kind: PredicateKind::In(values.to_vec().into()),
            });
        }
        self
    }

    /// Equality with `value`, skipped when unset
    pub fn eq<T: Into<FilterValue>>(mut self, column: &'static str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.0.push(Predicate {
                column,
                kind: PredicateKind::Eq(value.into()),
            });
        }
        self
    }

    /// Nullness of a nullable column, skipped when unset
    pub fn is_null(mut self, column: &'static str, is_null: Option<bool>) -> Self {
        if let Some(is_null) = is_null {
            self.0.push(Predicate {
                column,
                kind: PredicateKind::IsNull(is_null),
            });
        }
        self
    }

    pub fn finish(self) -> Vec<Predicate> {
        self.0
    }
}

/// A sparse, per-entity list filter
pub trait ListFilter: Default + Send + Sync {
    /// Predicates in their fixed, documented order
    fn predicates(&self) -> Vec<Predicate>;

    /// Requested page, if the caller overrides the default
    fn page(&self) -> Option<i64>;

    /// Requested row limit, if the caller overrides the default
    fn max_rows(&self) -> Option<i64>;
}

/// Declarative description of an entity's list query
pub trait ListQuery {
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;
    type Filter: ListFilter;

    const ENTITY: Entity;
    /// Explicit projection, joined columns aliased; never `SELECT *`
    const SELECT: &'static str;
    /// Entity table with its inner join
    const FROM: &'static str;
    /// Sort order keeping pages stable
    const ORDER_BY: &'static str;
}

fn push_predicates(query: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for predicate in predicates {
        query.push(" AND ");
        query.push(predicate.column);
        match &predicate.kind {
            PredicateKind::In(value) => {
                query.push(" = ANY(");
                push_value(query, value);
                query.push(")");
            }
            PredicateKind::Eq(value) => {
                query.push(" = ");
                push_value(query, value);
            }
            PredicateKind::IsNull(true) => {
                query.push(" IS NULL");
            }
            PredicateKind::IsNull(false) => {
                query.push(" IS NOT NULL");
            }
        }
    }
}

fn push_value(query: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value.clone() {
        FilterValue::BigInt(v) => query.push_bind(v),
        FilterValue::BigInts(v) => query.push_bind(v),
        FilterValue::Text(v) => query.push_bind(v),
        FilterValue::Texts(v) => query.push_bind(v),
        FilterValue::Bool(v) => query.push_bind(v),
    };
}

/// `SELECT COUNT(*)` over the filtered, unlimited query
pub(crate) fn count_query<Q: ListQuery>(predicates: &[Predicate]) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("SELECT COUNT(*) ");
    query.push(Q::FROM);
    query.push(" WHERE 1=1");
    push_predicates(&mut query, predicates);
    query
}

/// The filtered query with its page window applied
pub(crate) fn page_query<Q: ListQuery>(predicates: &[Predicate], pagination: &Pagination) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(Q::SELECT);
    query.push(" ");
    query.push(Q::FROM);
    query.push(" WHERE 1=1");
    push_predicates(&mut query, predicates);
    query.push(" ORDER BY ");
    query.push(Q::ORDER_BY);
    query.push(" LIMIT ");
    query.push_bind(pagination.max_rows);
    query.push(" OFFSET ");
    query.push_bind(pagination.offset);
    query
}

/// Count, paginate and fetch one page of `Q` matching `filter`.
///
/// A failure of either query aborts the call; no partial page is returned.
#[instrument(skip(db, settings, filter), fields(entity = %Q::ENTITY, total_count = tracing::field::Empty, row_count = tracing::field::Empty), err)]
pub async fn fetch_page<Q: ListQuery>(
    db: &mut PgConnection,
    settings: &QuerySettings,
    filter: &Q::Filter,
) -> Result<Paginated<Q::Row>> {
    let predicates = filter.predicates();
    let limit = settings.timeouts.query;

    let mut count = count_query::<Q>(&predicates);
    let total_count: i64 = bounded(limit, "count rows", count.build_query_scalar::<i64>().fetch_one(&mut *db)).await?;
    tracing::Span::current().record("total_count", total_count);

    let mut pagination = Pagination::new(settings.pagination);
    pagination.set_query_boundaries(filter.page(), filter.max_rows(), total_count);
    pagination.validate()?;

    // Rebuilt rather than reused: a built QueryBuilder cannot take more clauses
    let mut query = page_query::<Q>(&predicates, &pagination);
    let items = bounded(limit, "fetch rows", query.build_query_as::<Q::Row>().fetch_all(&mut *db)).await?;

    pagination.row_count = items.len() as i64;
    tracing::Span::current().record("row_count", pagination.row_count);

    Ok(Paginated { items, pagination })
}

/// Reduce a page to its only item, or fail when the filter matched zero or several rows.
pub fn expect_single<T>(page: Paginated<T>, entity: Entity) -> Result<T> {
    if page.pagination.row_count != 1 || page.pagination.total_count != 1 {
        return Err(DbError::AmbiguousOrMissingEntry {
            entity,
            found: page.pagination.total_count.max(page.pagination.row_count),
        });
    }
    page.items.into_iter().next().ok_or(DbError::AmbiguousOrMissingEntry { entity, found: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;

    #[derive(Debug, sqlx::FromRow)]
    struct Widget {
        #[allow(dead_code)]
        id: i64,
    }

    #[derive(Debug, Default)]
    struct WidgetFilter {
        ids_in: Vec<i64>,
        name_in: Vec<String>,
        is_active: Option<bool>,
        unowned: Option<bool>,
        page: Option<i64>,
        max_rows: Option<i64>,
    }

    impl ListFilter for WidgetFilter {
        fn predicates(&self) -> Vec<Predicate> {
            Predicates::new()
                .any("w.id", &self.ids_in)
                .any("w.name", &self.name_in)
                .eq("w.is_active", self.is_active)
                .is_null("w.owner_id", self.unowned)
                .finish()
        }

        fn page(&self) -> Option<i64> {
            self.page
        }

        fn max_rows(&self) -> Option<i64> {
            self.max_rows
        }
    }

    struct Widgets;

    impl ListQuery for Widgets {
        type Row = Widget;
        type Filter = WidgetFilter;

        const ENTITY: Entity = Entity::Category;
        const SELECT: &'static str = "SELECT w.id, wt.name AS type_name";
        const FROM: &'static str = "FROM widgets w INNER JOIN widget_types wt ON wt.id = w.type_id";
        const ORDER_BY: &'static str = "w.id";
    }

    fn pagination(page: i64, max_rows: i64, total: i64) -> Pagination {
        let mut p = Pagination::new(PaginationConfig::default());
        p.set_query_boundaries(Some(page), Some(max_rows), total);
        p
    }

    #[test]
    fn test_empty_filter_adds_no_predicates() {
        let filter = WidgetFilter::default();
        assert!(filter.predicates().is_empty());

        let query = count_query::<Widgets>(&filter.predicates());
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM widgets w INNER JOIN widget_types wt ON wt.id = w.type_id WHERE 1=1"
        );
    }

    #[test]
    fn test_predicates_follow_declared_order() {
        let filter = WidgetFilter {
            ids_in: vec![4, 5],
            name_in: vec!["a".to_string()],
            is_active: Some(true),
            unowned: Some(false),
            ..Default::default()
        };

        let columns: Vec<&str> = filter.predicates().iter().map(|p| p.column).collect();
        assert_eq!(columns, vec!["w.id", "w.name", "w.is_active", "w.owner_id"]);

        let query = count_query::<Widgets>(&filter.predicates());
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM widgets w INNER JOIN widget_types wt ON wt.id = w.type_id WHERE 1=1 \
             AND w.id = ANY($1) AND w.name = ANY($2) AND w.is_active = $3 AND w.owner_id IS NOT NULL"
        );
    }

    #[test]
    fn test_sparse_fields_are_skipped() {
        let filter = WidgetFilter {
            name_in: vec!["only".to_string()],
            unowned: Some(true),
            ..Default::default()
        };

        let predicates = filter.predicates();
        assert_eq!(
            predicates,
            vec![
                Predicate {
                    column: "w.name",
                    kind: PredicateKind::In(FilterValue::Texts(vec!["only".to_string()])),
                },
                Predicate {
                    column: "w.owner_id",
                    kind: PredicateKind::IsNull(true),
                },
            ]
        );
    }

    #[test]
    fn test_page_query_appends_window_after_predicates() {
        let filter = WidgetFilter {
            ids_in: vec![1],
            ..Default::default()
        };

        let query = page_query::<Widgets>(&filter.predicates(), &pagination(3, 10, 100));
        assert_eq!(
            query.sql(),
            "SELECT w.id, wt.name AS type_name FROM widgets w INNER JOIN widget_types wt ON wt.id = w.type_id \
             WHERE 1=1 AND w.id = ANY($1) ORDER BY w.id LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_expect_single_returns_only_item() {
        let mut p = pagination(1, 2, 1);
        p.row_count = 1;
        let page = Paginated {
            items: vec!["one"],
            pagination: p,
        };

        assert_eq!(expect_single(page, Entity::Category).unwrap(), "one");
    }

    #[test]
    fn test_expect_single_rejects_empty_page() {
        let page: Paginated<&str> = Paginated {
            items: vec![],
            pagination: pagination(1, 2, 0),
        };

        assert!(matches!(
            expect_single(page, Entity::ClickTracker),
            Err(DbError::AmbiguousOrMissingEntry {
                entity: Entity::ClickTracker,
                found: 0
            })
        ));
    }

    #[test]
    fn test_expect_single_rejects_ambiguous_page() {
        let mut p = pagination(1, 2, 3);
        p.row_count = 2;
        let page = Paginated {
            items: vec!["a", "b"],
            pagination: p,
        };

        assert!(matches!(
            expect_single(page, Entity::CapturePage),
            Err(DbError::AmbiguousOrMissingEntry { found: 3, .. })
        ));
    }
}
