//! Envelope returned by every list endpoint.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    pub count: usize,
    pub offset: i64,
    pub limit: i64,
    /// Size of the collection before paging.
    pub total: u64,
}

impl<T> ListResponse<T> {
    pub fn new(results: Vec<T>, offset: i64, limit: i64, total: u64) -> Self {
        Self {
            count: results.len(),
            results,
            offset,
            limit,
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListResponse<U> {
        ListResponse {
            results: self.results.into_iter().map(f).collect(),
            count: self.count,
            offset: self.offset,
            limit: self.limit,
            total: self.total,
        }
    }
}
