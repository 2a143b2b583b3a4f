//! Limit/offset windowing for collections held in memory.

use serde::Deserialize;

/// A `(limit, offset)` pair. A limit of zero or less means "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageWindow {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl PageWindow {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Replace a non-positive limit with `default`.
    pub fn with_default_limit(mut self, default: i64) -> Self {
        if self.limit <= 0 {
            self.limit = default;
        }
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit <= 0
    }

    /// Offset clamped to zero.
    pub fn start(&self) -> usize {
        usize::try_from(self.offset.max(0)).unwrap_or(usize::MAX)
    }

    /// `None` when unbounded.
    pub fn max_items(&self) -> Option<usize> {
        if self.is_unbounded() {
            None
        } else {
            Some(usize::try_from(self.limit).unwrap_or(usize::MAX))
        }
    }

    /// Cut the window out of an already filtered and sorted list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.start());
        match self.max_items() {
            Some(max) => skipped.take(max).collect(),
            None => skipped.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten() -> Vec<i32> {
        (1..=10).collect()
    }

    #[test]
    fn test_last_page() {
        assert_eq!(PageWindow::new(3, 7).apply(ten()), vec![8, 9, 10]);
    }

    #[test]
    fn test_offset_past_end() {
        assert!(PageWindow::new(3, 20).apply(ten()).is_empty());
    }

    #[test]
    fn test_zero_limit_returns_rest() {
        assert_eq!(PageWindow::new(0, 4).apply(ten()), vec![5, 6, 7, 8, 9, 10]);
        assert_eq!(PageWindow::new(-1, 0).apply(ten()), ten());
    }

    #[test]
    fn test_limit_larger_than_remaining() {
        assert_eq!(PageWindow::new(50, 8).apply(ten()), vec![9, 10]);
    }

    #[test]
    fn test_negative_offset_is_clamped() {
        assert_eq!(PageWindow::new(2, -5).apply(ten()), vec![1, 2]);
    }

    #[test]
    fn test_default_limit() {
        let window = PageWindow::new(0, 0).with_default_limit(100);
        assert_eq!(window.limit, 100);
        let window = PageWindow::new(5, 0).with_default_limit(100);
        assert_eq!(window.limit, 5);
    }
}
