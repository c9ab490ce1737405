//! Page plans

use std::ops::RangeInclusive;

/// Default number of pages sampled for schema inference
pub const DEFAULT_SAMPLE_PAGE_CAP: u32 = 200;

/// Every page of a job, 1-based
pub fn all_pages(total_pages: u32) -> RangeInclusive<u32> {
    1..=total_pages
}

/// Pages to sample for schema inference
///
/// When `total_pages <= cap` every page is sampled. Otherwise `cap` pages
/// are spread evenly over `[1, total_pages]` with
/// `index = floor(i * total_pages / cap) + 1` for `i` in `0..cap`, which
/// always includes page 1. The result is strictly increasing.
pub fn sample_pages(total_pages: u32, cap: u32) -> Vec<u32> {
    if total_pages == 0 || cap == 0 {
        return Vec::new();
    }

    if total_pages <= cap {
        return all_pages(total_pages).collect();
    }

    let total = u64::from(total_pages);
    let cap = u64::from(cap);
    (0..cap).map(|i| ((i * total) / cap + 1) as u32).collect()
}
