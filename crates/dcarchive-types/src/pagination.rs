use serde::{Deserialize, Serialize};

/// Page window metadata returned alongside a page of builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl Pagination {
    /// `page` is 1-based; values below 1 are clamped. A zero `limit` is
    /// treated as 1.
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            total,
            page: page.max(1),
            limit,
            pages: total.div_ceil(limit),
        }
    }

    /// Number of rows to skip before this page begins.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}
