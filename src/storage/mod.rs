//! Document store abstractions for listing persistence.
//!
//! Listings are kept as JSON documents keyed by canonical URL, next to a
//! mutable status. There is no fixed schema: structure is interpreted at
//! query time through path projections evaluated inside the storage engine.
//!
//! ## Table Layout
//!
//! ```text
//! houses
//! ├── key         TEXT PRIMARY KEY   canonical URL (or site-scoped id)
//! ├── status      TEXT               to-review | to-view | viewed-yes | viewed-no
//! ├── data        TEXT (JSON)        listing document
//! └── updated_at  TEXT (RFC 3339)    last write
//! ```

mod query;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DocPath, Document, DocumentShape, Filter, Projection, PropertyRecord, Row, Status};

// Re-export for convenience
pub use sqlite::SqliteStore;

/// Trait for listing storage backends.
///
/// Every mutating call commits on its own; concurrent writers to one key are
/// last-write-wins.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Whether this store holds listings for the URL's host.
    fn supports(&self, url: &str) -> Result<bool>;

    /// Whether this store can hold documents of the given shape.
    fn accepts(&self, _shape: DocumentShape) -> bool {
        true
    }

    /// Insert or replace a record. Returns the key.
    async fn set(&self, key: &str, status: Status, document: &Document) -> Result<String>;

    /// Exact lookup of a document. `None` means no record for the key.
    async fn get(&self, key: &str) -> Result<Option<Document>>;

    /// Exact lookup of the full record.
    async fn get_record(&self, key: &str) -> Result<Option<PropertyRecord>>;

    /// Remove a record. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<String>;

    /// Set the status only, leaving the document untouched.
    async fn update_status(&self, key: &str, status: Status) -> Result<String>;

    /// One row per matching record, shaped by `projections`.
    async fn project(&self, projections: &[Projection], filters: &[Filter]) -> Result<Vec<Row>>;

    /// One row per element of the array at `array_path` in each matching
    /// record. Element paths in `projections` are relative to the element.
    /// Absent or empty arrays produce no rows.
    async fn project_array(
        &self,
        array_path: &DocPath,
        projections: &[Projection],
        filters: &[Filter],
    ) -> Result<Vec<Row>>;

    /// Number of records matching `filters`.
    async fn count(&self, filters: &[Filter]) -> Result<usize>;
}
