//! Offset/limit paging over API collections.

use serde::Serialize;

/// A 1-based page request resolved against a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    /// Parse the `page` query parameter.
    ///
    /// Missing or unparsable values and `0` select the first page; negative
    /// values are folded to their absolute value.
    pub fn from_query(raw: Option<&str>, size: u64) -> Self {
        let number = raw
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(i64::unsigned_abs)
            .filter(|n| *n > 0)
            .unwrap_or(1);
        Self::new(number, size)
    }

    pub fn new(number: u64, size: u64) -> Self {
        Self {
            number: number.max(1),
            size,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> u64 {
        self.size
    }

    /// Previous/next page numbers for a collection of `total` records.
    pub fn pager(&self, total: u64) -> Pager {
        Pager {
            page: self.number,
            prev: (self.number > 1).then(|| self.number - 1),
            next: (self.number.saturating_mul(self.size) < total).then(|| self.number + 1),
            total,
        }
    }
}

/// Navigation data handed to list templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub page: u64,
    pub prev: Option<u64>,
    pub next: Option<u64>,
    pub total: u64,
}
