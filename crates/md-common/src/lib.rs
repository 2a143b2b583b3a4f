//! Mediadesk Common
//!
//! Query conventions shared by every list endpoint of the admin API:
//! the `key:value` filter string, the `field:ORDER` sort string, limit/offset
//! windowing for in-memory collections and the per-item bulk outcome record.

pub mod bulk;
pub mod date;
pub mod filter;
pub mod list;
pub mod page;
pub mod sort;

pub use bulk::BulkOperationResult;
pub use date::{parse_date_range, parse_utc, DateParseError, DateRange};
pub use filter::{contains_ignore_case, Filters};
pub use list::ListResponse;
pub use page::PageWindow;
pub use sort::{
    cmp_ignore_case, parse_sort, resolve_sort, sort_by_criteria, SortCriterion, SortOrder,
    UnknownSortField,
};
