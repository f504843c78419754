//! Page slicing
//!
//! [`Paginator`] pages an in-memory slice, [`QuerySetPaginator`] pages a
//! [`QuerySet`]. Both compute their layout once at construction and report
//! invalid page numbers through [`PaginationData::errors`] instead of failing.
//!
//! ```ignore
//! let numbers = [1, 2, 3, 4, 5];
//! let paginator = Paginator::new(&numbers, PerPage::limited(2)?);
//! let (page, data) = paginator.get_page(3);
//! assert_eq!(page, &[5]);
//! assert_eq!(data.page_count, 3);
//! ```

use tracing::{debug, trace};

use super::queryset::QuerySet;
use crate::shared::{PaginationData, PerPage, QueryResult, INVALID_PAGE_ERROR};

/// Page arithmetic shared by both paginators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub objects_count: u64,
    pub per_page: u64,
    pub page_count: u64,
}

impl PageLayout {
    pub fn new(objects_count: u64, per_page: PerPage) -> Self {
        let per_page = per_page.resolve(objects_count);
        // Unlimited over an empty collection resolves to a zero page size
        let page_count = if per_page == 0 {
            0
        } else {
            objects_count.div_ceil(per_page)
        };
        Self {
            objects_count,
            per_page,
            page_count,
        }
    }

    /// A page size of one is never valid.
    pub fn is_page_valid(&self, number: i64) -> bool {
        self.per_page > 1 && number > 0 && (number as u64) <= self.page_count
    }

    /// Half-open index range of page `number`.
    pub fn bounds(&self, number: i64) -> (u64, u64) {
        let start = if number > 1 {
            ((number - 1) as u64).saturating_mul(self.per_page)
        } else {
            0
        };
        (start, start.saturating_add(self.per_page))
    }

    fn pagination_data(&self, number: i64) -> PaginationData {
        PaginationData {
            objects_count: self.objects_count,
            page_number: number,
            page_count: self.page_count,
            per_page: self.per_page,
            errors: None,
        }
    }

    /// Metadata for page `number` plus the range to slice, `None` when invalid.
    pub fn page(&self, number: i64) -> (Option<(u64, u64)>, PaginationData) {
        let mut data = self.pagination_data(number);

        if self.is_page_valid(number) {
            let (start, end) = self.bounds(number);
            trace!(number, start, end, "Page bounds");
            (Some((start, end)), data)
        } else {
            debug!(
                number,
                page_count = self.page_count,
                per_page = self.per_page,
                "Invalid page requested"
            );
            data.errors = Some(INVALID_PAGE_ERROR.to_string());
            (None, data)
        }
    }
}

/// Paginator over an in-memory slice.
#[derive(Debug, Clone)]
pub struct Paginator<'a, T> {
    objects: &'a [T],
    layout: PageLayout,
}

impl<'a, T> Paginator<'a, T> {
    pub fn new(objects: &'a [T], per_page: PerPage) -> Self {
        Self {
            objects,
            layout: PageLayout::new(objects.len() as u64, per_page),
        }
    }

    pub fn objects_count(&self) -> u64 {
        self.layout.objects_count
    }

    pub fn per_page(&self) -> u64 {
        self.layout.per_page
    }

    pub fn page_count(&self) -> u64 {
        self.layout.page_count
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Objects of page `number` (1-based) and the pagination metadata.
    pub fn get_page(&self, number: i64) -> (&'a [T], PaginationData) {
        let (bounds, data) = self.layout.page(number);
        let (start, end) = bounds.unwrap_or((0, 0));
        (self.slice_objects(start, end), data)
    }

    fn slice_objects(&self, start: u64, end: u64) -> &'a [T] {
        let len = self.objects.len();
        let start = usize::try_from(start).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(end).unwrap_or(usize::MAX).clamp(start, len);
        &self.objects[start..end]
    }
}

/// Paginator over a query set.
///
/// The query set is deduplicated once and counted through the backend, so
/// a deferred database query is never materialized just to learn its size.
#[derive(Debug, Clone)]
pub struct QuerySetPaginator<Q> {
    queryset: Q,
    layout: PageLayout,
}

impl<Q: QuerySet> QuerySetPaginator<Q> {
    pub async fn new(queryset: Q, per_page: PerPage) -> QueryResult<Self> {
        let queryset = queryset.distinct();
        let objects_count = queryset.count().await?;
        debug!(objects_count, %per_page, "Query set paginator created");
        Ok(Self {
            queryset,
            layout: PageLayout::new(objects_count, per_page),
        })
    }

    pub fn objects_count(&self) -> u64 {
        self.layout.objects_count
    }

    pub fn per_page(&self) -> u64 {
        self.layout.per_page
    }

    pub fn page_count(&self) -> u64 {
        self.layout.page_count
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Deduplicated query set being paginated.
    pub fn queryset(&self) -> &Q {
        &self.queryset
    }

    /// Query set for page `number` (1-based) and the pagination metadata.
    pub fn get_page(&self, number: i64) -> (Q, PaginationData) {
        let (bounds, data) = self.layout.page(number);
        let (start, end) = bounds.unwrap_or((0, 0));
        (self.queryset.slice(start, end), data)
    }
}

// ── Tests ──────────────────────────────────────────────────────
