//! Utility functions for string and number formatting.

pub mod format;

pub use format::{format_date, format_grouped, format_optional, truncate_string};
