pub mod filters;
pub mod paginator;
pub mod queryset;

pub use filters::{apply_filters, Filter, FilterParams, QuerySetFilter};
pub use paginator::{PageLayout, Paginator, QuerySetPaginator};
pub use queryset::{Lookup, LookupOperator, QuerySet};
