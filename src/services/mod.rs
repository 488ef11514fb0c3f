//! Service layer for the acquisition pipeline.
//!
//! This module contains the business logic for:
//! - Raw content retrieval (`HttpFetcher`)
//! - Page model extraction (`PageModelParser`)
//! - Orchestration and triage (`HouseService`)
//! - Presentation notifications (`EventBus`)

pub mod events;
pub mod fetcher;
pub mod house;
pub mod parser;

pub use events::{EventBus, PropertyEvent};
pub use fetcher::{FetchedItem, HttpFetcher, PropertyFetcher};
pub use house::{BatchItem, HouseService};
pub use parser::{PageModelParser, PropertyParser, extract_models};
