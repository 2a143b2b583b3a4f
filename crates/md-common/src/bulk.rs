//! Per-item outcome of a batch request.

use serde::{Deserialize, Serialize};

/// Outcome buckets of a bulk operation. Always returned with HTTP 200; a
/// failing item never aborts the remaining ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResult {
    pub ok: Vec<String>,
    pub not_found: Vec<String>,
    pub server_error: Vec<String>,
    pub unauthorized: Vec<String>,
}

impl BulkOperationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ok(&mut self, id: impl ToString) {
        self.ok.push(id.to_string());
    }

    pub fn add_not_found(&mut self, id: impl ToString) {
        self.not_found.push(id.to_string());
    }

    pub fn add_server_error(&mut self, id: impl ToString) {
        self.server_error.push(id.to_string());
    }

    pub fn add_unauthorized(&mut self, id: impl ToString) {
        self.unauthorized.push(id.to_string());
    }

    pub fn total(&self) -> usize {
        self.ok.len() + self.not_found.len() + self.server_error.len() + self.unauthorized.len()
    }

    pub fn all_ok(&self) -> bool {
        self.ok.len() == self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_buckets() {
        let mut result = BulkOperationResult::new();
        result.add_ok("A");
        result.add_not_found("B");
        result.add_ok(42);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ok"], serde_json::json!(["A", "42"]));
        assert_eq!(json["notFound"], serde_json::json!(["B"]));
        assert_eq!(json["serverError"], serde_json::json!([]));
        assert_eq!(json["unauthorized"], serde_json::json!([]));
    }

    #[test]
    fn test_all_ok() {
        let mut result = BulkOperationResult::new();
        assert!(result.all_ok());
        result.add_ok("A");
        assert!(result.all_ok());
        result.add_server_error("B");
        assert!(!result.all_ok());
        assert_eq!(result.total(), 2);
    }
}
