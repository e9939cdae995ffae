//! Listing/pagination primitives shared by store contracts.

use serde::{Deserialize, Serialize};

/// Page size applied when a query does not specify a limit.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on a single page. Stores clamp requested limits to this value
/// so a caller can never force an unbounded scan.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of a scoped listing.
///
/// `total` counts matches after scoping and filters but **before** pagination,
/// so callers can compute page counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub(crate) fn clamp_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        limit.min(MAX_PAGE_SIZE)
    }
}
