//! Page-based pagination shared by every list operation.
//!
//! A [`Pagination`] is created fresh for each list call. The translator first
//! counts the matching rows, then calls [`Pagination::set_query_boundaries`]
//! to derive the offset and page list, validates the result, runs the limited
//! query and finally records how many rows actually came back in
//! [`Pagination::row_count`].
//!
//! `total_count` and `row_count` are separate: the first is the
//! number of rows matching the filter before the limit, the second the number
//! bound on this page. Nothing ties the two queries to one snapshot, so a
//! concurrent writer may make them disagree.

use crate::config::PaginationConfig;
use serde::Serialize;

/// Pagination state for one list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Requested page, 1-based
    pub page: i64,
    /// Maximum rows on one page
    pub max_rows: i64,
    /// Rows skipped before this page
    pub offset: i64,
    /// Rows returned on this page (set after the limited query runs)
    pub row_count: i64,
    /// Rows matching the filter before the limit (set from the count query)
    pub total_count: i64,
    /// Every page number, `1..=total_pages`
    pub pages: Vec<i64>,
    #[serde(skip)]
    limits: PaginationConfig,
}

impl Pagination {
    pub fn new(limits: PaginationConfig) -> Self {
        Self {
            page: 1,
            max_rows: limits.default_max_rows,
            offset: 0,
            row_count: 0,
            total_count: 0,
            pages: vec![1],
            limits,
        }
    }

    /// Derive offset and page list from the requested page, row limit and match count.
    ///
    /// An unset row limit takes the configured default and one above the ceiling is
    /// clamped to it. Explicit values below 1 are kept as-is so that
    /// [`Pagination::validate`] can reject them.
    pub fn set_query_boundaries(&mut self, page: Option<i64>, max_rows: Option<i64>, total_count: i64) {
        self.page = page.unwrap_or(1);
        self.max_rows = match max_rows {
            None => self.limits.default_max_rows,
            Some(rows) => rows.min(self.limits.max_rows_ceiling),
        };
        self.total_count = total_count.max(0);
        self.offset = (self.page - 1).max(0).saturating_mul(self.max_rows.max(0));
        self.pages = (1..=self.total_pages()).collect();
    }

    /// Number of pages needed for `total_count` rows; an empty result still has one page.
    pub fn total_pages(&self) -> i64 {
        if self.max_rows < 1 {
            return 1;
        }
        let pages = (self.total_count + self.max_rows - 1) / self.max_rows;
        pages.max(1)
    }

    pub fn validate(&self) -> crate::db::errors::Result<()> {
        use crate::db::errors::DbError;

        if self.page < 1 {
            return Err(DbError::InvalidPagination {
                message: format!("page must be at least 1, got {}", self.page),
            });
        }
        if self.max_rows < 1 {
            return Err(DbError::InvalidPagination {
                message: format!("max rows must be at least 1, got {}", self.max_rows),
            });
        }
        if self.max_rows > self.limits.max_rows_ceiling {
            return Err(DbError::InvalidPagination {
                message: format!(
                    "max rows {} exceeds the configured ceiling of {}",
                    self.max_rows, self.limits.max_rows_ceiling
                ),
            });
        }
        Ok(())
    }
}

/// One page of results together with the pagination that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    /// Convert every item, keeping the pagination untouched
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
