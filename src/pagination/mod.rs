//! Pagination module
//!
//! Page planning for the remote API's 1-based page numbers.
//!
//! # Overview
//!
//! The API announces a total page count on every envelope. Loading walks
//! every page; schema sampling walks an evenly spread subset of them.

mod plan;

pub use plan::{all_pages, sample_pages, DEFAULT_SAMPLE_PAGE_CAP};

#[cfg(test)]
mod tests;
