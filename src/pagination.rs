//! Page/limit normalization for list endpoints.

/// Page used when the caller omits `page` or sends garbage.
pub const DEFAULT_PAGE: u64 = 1;
/// Page size used when the caller omits `limit` or sends garbage.
pub const DEFAULT_LIMIT: u64 = 20;
/// Hard ceiling on page size. Larger requests are clamped silently.
pub const MAX_LIMIT: u64 = 100;

/// Effective pagination bounds. `page >= 1` and `1 <= limit <= MAX_LIMIT` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds bounds from the raw `page` and `limit` query values.
    ///
    /// Absent, non-numeric and non-positive inputs fall back to the defaults.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(limit).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        Self { page, limit }
    }

    /// Number of records to skip before the requested page.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`, zero when there is nothing to page through.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw?.trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 1)
        .map(|n| n as u64)
}
