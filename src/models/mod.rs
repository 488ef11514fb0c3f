// src/models/mod.rs

//! Domain models for the acquisition pipeline.
//!
//! This module contains the data structures shared by sites, fetchers,
//! parsers, stores and the service layer.

mod config;
mod property;
pub mod query;
mod shape;
mod status;

// Re-export all public types
pub use config::{Config, FetcherConfig, SiteConfig, StoreConfig};
pub use property::{Document, ListingSummary, PropertyRecord, Row};
pub use query::{Column, DocPath, Filter, Projection, Source};
pub use shape::DocumentShape;
pub use status::Status;
