//! Filter string parsing
//!
//! List endpoints accept a single `filter` query parameter of the form
//! `key1:value1,key2:value2`. Values are kept as strings; each endpoint
//! converts the keys it understands and ignores the rest.

use std::collections::HashMap;
use tracing::debug;

/// Parsed `filter` query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    entries: HashMap<String, String>,
}

impl Filters {
    /// Parse a `k:v,k2:v2` string.
    ///
    /// Each segment is split on its first colon so values such as ISO
    /// timestamps or `from/to` ranges survive intact. Segments without a
    /// colon or with an empty key are dropped. Never fails.
    pub fn parse(input: Option<&str>) -> Self {
        let mut entries = HashMap::new();
        let Some(input) = input else {
            return Self { entries };
        };

        for segment in input.split(',') {
            let Some((key, value)) = segment.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), value.to_string());
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value of `key` with surrounding whitespace removed, `None` when blank.
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Log every key not listed in `known` at debug level. Unknown keys are
    /// never rejected.
    pub fn warn_unknown(&self, known: &[&str]) {
        for key in self.entries.keys() {
            if !known.contains(&key.as_str()) {
                debug!(filter = %key, "Ignoring unknown filter key");
            }
        }
    }
}

impl FromIterator<(String, String)> for Filters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Case-insensitive substring match used by free-text filters.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Physics Lecture", "lecture"));
        assert!(contains_ignore_case("abc", ""));
        assert!(!contains_ignore_case("Physics", "chem"));
    }

    #[test]
    fn test_parse_pairs() {
        let filters = Filters::parse(Some("a:1,b:2"));
        assert_eq!(filters.len(), 2);
        assert_eq!(filters.get("a"), Some("1"));
        assert_eq!(filters.get("b"), Some("2"));
    }

    #[test]
    fn test_parse_empty_and_missing() {
        assert!(Filters::parse(Some("")).is_empty());
        assert!(Filters::parse(None).is_empty());
    }

    #[test]
    fn test_segment_without_colon_is_skipped() {
        let filters = Filters::parse(Some("badtoken"));
        assert!(filters.is_empty());

        let filters = Filters::parse(Some("badtoken,title:Lecture"));
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get("title"), Some("Lecture"));
    }

    #[test]
    fn test_split_on_first_colon_only() {
        let filters =
            Filters::parse(Some("startDate:2024-01-01T00:00:00Z/2024-01-02T00:00:00Z"));
        assert_eq!(
            filters.get("startDate"),
            Some("2024-01-01T00:00:00Z/2024-01-02T00:00:00Z")
        );
    }

    #[test]
    fn test_empty_key_is_skipped() {
        let filters = Filters::parse(Some(":value, :other,name:x"));
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get("name"), Some("x"));
    }

    #[test]
    fn test_later_key_wins() {
        let filters = Filters::parse(Some("name:first,name:second"));
        assert_eq!(filters.get("name"), Some("second"));
    }

    #[test]
    fn test_get_trimmed() {
        let filters = Filters::parse(Some("name:  ,title: Intro "));
        assert_eq!(filters.get_trimmed("name"), None);
        assert_eq!(filters.get_trimmed("title"), Some("Intro"));
    }
}
