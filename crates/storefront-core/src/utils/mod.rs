//! Utility functions for string matching and formatting.

pub mod format;

pub use format::{age_display, contains_ignore_case, truncate_string};
