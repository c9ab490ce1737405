//! Tests for pagination module

use super::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test]
fn test_all_pages() {
    assert_eq!(all_pages(3).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(all_pages(0).count(), 0);
}

#[test_case(0, 200, 0 ; "no pages")]
#[test_case(1, 200, 1 ; "single page")]
#[test_case(200, 200, 200 ; "exactly the cap")]
#[test_case(201, 200, 200 ; "just over the cap")]
#[test_case(100_000, 200, 200 ; "far over the cap")]
fn test_sample_page_count(total: u32, cap: u32, expected: usize) {
    assert_eq!(sample_pages(total, cap).len(), expected);
}

#[test]
fn test_sample_pages_under_cap_takes_all() {
    assert_eq!(sample_pages(5, 200), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_sample_pages_evenly_spaced() {
    assert_eq!(sample_pages(10, 4), vec![1, 3, 6, 8]);
    assert_eq!(sample_pages(1000, 5), vec![1, 201, 401, 601, 801]);
}

#[test]
fn test_sample_pages_distinct_and_in_range() {
    for total in [201, 399, 4_000, u32::MAX] {
        let pages = sample_pages(total, DEFAULT_SAMPLE_PAGE_CAP);
        assert_eq!(pages[0], 1);
        assert!(pages.windows(2).all(|w| w[0] < w[1]));
        assert!(pages.iter().all(|p| *p >= 1 && *p <= total));
    }
}

#[test]
fn test_sample_pages_zero_cap() {
    assert!(sample_pages(10, 0).is_empty());
}
