//! HTML parsing and data extraction
//!
//! This module handles parsing the primary stock page and extracting
//! per-category item entries.

pub mod selectors;
pub mod stock;

// Re-export main parser and public types
pub use selectors::{StockSelectors, STOCK_SECTION_MARKER};
pub use stock::{parse_quantity, StockPageParser};
