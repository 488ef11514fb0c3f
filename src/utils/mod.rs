//! Utility functions and helpers.

pub mod http;
pub mod scan;
pub mod url;
