//! SQLite document store.
//!
//! Owns exactly one connection for its lifetime: opened on construction,
//! released by [`SqliteStore::close`] (or on drop). Calls sharing one store
//! are serialized on that connection and each statement commits on its own.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::error::{AppError, Result};
use crate::models::{DocPath, Document, Filter, Projection, PropertyRecord, Row, Status};
use crate::storage::query::{self, Statement, TABLE};
use crate::storage::PropertyStore;
use crate::utils::url::check_host_in;

/// SQLite-backed listing store.
pub struct SqliteStore {
    pool: SqlitePool,
    hosts: Vec<String>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file holding listings for `hosts`.
    pub async fn open(path: impl AsRef<Path>, hosts: Vec<String>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self::connect(options, hosts).await
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory(hosts: Vec<String>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options, hosts).await
    }

    async fn connect(options: SqliteConnectOptions, hosts: Vec<String>) -> Result<Self> {
        // One long-lived connection; an in-memory database lives exactly as long as it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

        let store = Self { pool, hosts };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {TABLE} (
                "key" TEXT PRIMARY KEY NOT NULL,
                status TEXT NOT NULL,
                data TEXT NOT NULL CHECK (json_valid(data)),
                updated_at TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{TABLE}_status ON {TABLE}(status)"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Release the connection. Further calls fail with `StorageUnavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_rows(&self, statement: Statement) -> Result<Vec<Row>> {
        log::debug!("Query: {}", statement.sql);
        let mut query = sqlx::query_scalar::<_, String>(&statement.sql);
        for param in &statement.params {
            query = query.bind(param.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|text| {
                serde_json::from_str::<Row>(text)
                    .map_err(|e| AppError::query(format!("Invalid projected row: {e}")))
            })
            .collect()
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    key: String,
    status: String,
    data: String,
    updated_at: String,
}

impl RecordRow {
    fn into_record(self) -> Result<PropertyRecord> {
        let status = Status::from_str(&self.status)
            .map_err(|_| AppError::query(format!("Invalid stored status: {}", self.status)))?;
        let data = decode_document(&self.data)?;
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|e| AppError::query(format!("Invalid stored timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(PropertyRecord {
            key: self.key,
            status,
            data,
            updated_at,
        })
    }
}

fn decode_document(text: &str) -> Result<Document> {
    serde_json::from_str(text).map_err(|e| AppError::query(format!("Invalid stored document: {e}")))
}

#[async_trait]
impl PropertyStore for SqliteStore {
    fn supports(&self, url: &str) -> Result<bool> {
        check_host_in(url, &self.hosts)
    }

    async fn set(&self, key: &str, status: Status, document: &Document) -> Result<String> {
        let data = serde_json::to_string(document)?;
        sqlx::query(&format!(
            r#"
            INSERT INTO {TABLE} ("key", status, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT("key") DO UPDATE SET
                status = excluded.status,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#
        ))
        .bind(key)
        .bind(status.as_str())
        .bind(data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        log::debug!("Stored {} as {}", key, status);
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> Result<Option<Document>> {
        let data: Option<String> =
            sqlx::query_scalar(&format!(r#"SELECT data FROM {TABLE} WHERE "key" = ?"#))
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        data.as_deref().map(decode_document).transpose()
    }

    async fn get_record(&self, key: &str) -> Result<Option<PropertyRecord>> {
        let row: Option<RecordRow> = sqlx::query_as(&format!(
            r#"SELECT "key", status, data, updated_at FROM {TABLE} WHERE "key" = ?"#
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecordRow::into_record).transpose()
    }

    async fn delete(&self, key: &str) -> Result<String> {
        sqlx::query(&format!(r#"DELETE FROM {TABLE} WHERE "key" = ?"#))
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(key.to_string())
    }

    async fn update_status(&self, key: &str, status: Status) -> Result<String> {
        let result = sqlx::query(&format!(r#"UPDATE {TABLE} SET status = ? WHERE "key" = ?"#))
            .bind(status.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            log::debug!("Status update for unknown key {}", key);
        }
        Ok(key.to_string())
    }

    async fn project(&self, projections: &[Projection], filters: &[Filter]) -> Result<Vec<Row>> {
        self.fetch_rows(query::atomic(projections, filters)?).await
    }

    async fn project_array(
        &self,
        array_path: &DocPath,
        projections: &[Projection],
        filters: &[Filter],
    ) -> Result<Vec<Row>> {
        self.fetch_rows(query::array(array_path, projections, filters)?)
            .await
    }

    async fn count(&self, filters: &[Filter]) -> Result<usize> {
        let statement = query::count(filters);
        let mut query = sqlx::query_scalar::<_, i64>(&statement.sql);
        for param in &statement.params {
            query = query.bind(param.as_str());
        }
        let count = query.fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::projections;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    const KEY: &str = "163179074";

    fn hosts() -> Vec<String> {
        vec!["www.rightmove.co.uk".to_string()]
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    fn listing(id: u64, images: &[&str]) -> Document {
        let images: Vec<Value> = images.iter().map(|url| json!({ "url": url })).collect();
        doc(json!({
            "propertyData": {
                "id": id,
                "text": { "description": format!("Listing {id}") },
                "images": images
            }
        }))
    }

    async fn store() -> SqliteStore {
        SqliteStore::in_memory(hosts()).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let store = store().await;
        let document = listing(163179074, &["https://x/1.jpg", "https://x/2.jpg"]);

        assert_eq!(store.set(KEY, Status::ToReview, &document).await.unwrap(), KEY);
        assert_eq!(store.get(KEY).await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn test_get_absent_vs_empty_document() {
        let store = store().await;
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("empty", Status::ToReview, &Document::new()).await.unwrap();
        assert_eq!(store.get("empty").await.unwrap(), Some(Document::new()));
    }

    #[tokio::test]
    async fn test_set_replaces_document_and_status() {
        let store = store().await;
        store.set(KEY, Status::ToReview, &listing(1, &[])).await.unwrap();
        store.set(KEY, Status::ViewedNo, &listing(2, &[])).await.unwrap();

        let record = store.get_record(KEY).await.unwrap().unwrap();
        assert_eq!(record.status, Status::ViewedNo);
        assert_eq!(record.data, listing(2, &[]));
        assert_eq!(store.count(&[]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store().await;
        store.set(KEY, Status::ToReview, &listing(1, &[])).await.unwrap();

        assert_eq!(store.delete(KEY).await.unwrap(), KEY);
        assert_eq!(store.delete(KEY).await.unwrap(), KEY);
        assert_eq!(store.get(KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_status_moves_between_buckets() {
        let store = store().await;
        store.set(KEY, Status::ToReview, &listing(1, &[])).await.unwrap();
        store.set("other", Status::ToReview, &listing(2, &[])).await.unwrap();

        store.update_status(KEY, Status::ToView).await.unwrap();

        let keys = projections([("key", "key")]).unwrap();
        let to_view = store.project(&keys, &[Filter::Status(Status::ToView)]).await.unwrap();
        let to_review = store.project(&keys, &[Filter::Status(Status::ToReview)]).await.unwrap();

        assert_eq!(to_view, vec![doc(json!({ "key": KEY }))]);
        assert_eq!(to_review, vec![doc(json!({ "key": "other" }))]);
        assert_eq!(store.count(&[]).await.unwrap(), 2);
        assert_eq!(store.get(KEY).await.unwrap(), Some(listing(1, &[])));
    }

    #[tokio::test]
    async fn test_update_status_twice_is_idempotent() {
        let store = store().await;
        store.set(KEY, Status::ToReview, &listing(1, &[])).await.unwrap();

        store.update_status(KEY, Status::ToView).await.unwrap();
        store.update_status(KEY, Status::ToView).await.unwrap();

        let record = store.get_record(KEY).await.unwrap().unwrap();
        assert_eq!(record.status, Status::ToView);
    }

    #[tokio::test]
    async fn test_update_status_absent_key_does_not_fail() {
        let store = store().await;
        assert!(store.update_status("missing", Status::ToView).await.is_ok());
        assert_eq!(store.count(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_project_nested_paths() {
        let store = store().await;
        store.set(KEY, Status::ToReview, &listing(163179074, &[])).await.unwrap();

        let fields = projections([
            ("key", "property_number"),
            ("propertyData.id", "id"),
            ("propertyData.text.description", "description"),
            ("propertyData.missing", "missing"),
        ])
        .unwrap();
        let rows = store.project(&fields, &[]).await.unwrap();

        assert_eq!(
            rows,
            vec![doc(json!({
                "property_number": KEY,
                "id": 163179074,
                "description": "Listing 163179074",
                "missing": null
            }))]
        );
    }

    #[tokio::test]
    async fn test_project_nested_object_value() {
        let store = store().await;
        store.set(KEY, Status::ToReview, &listing(1, &[])).await.unwrap();

        let fields = projections([("propertyData.text", "text")]).unwrap();
        let rows = store.project(&fields, &[]).await.unwrap();
        assert_eq!(rows[0]["text"], json!({ "description": "Listing 1" }));
    }

    #[tokio::test]
    async fn test_project_array_scenario() {
        let store = store().await;
        let document = doc(json!({
            "propertyData": { "id": 163179074, "images": [{ "url": "https://x/1.jpg" }] }
        }));
        store.set(KEY, Status::ToReview, &document).await.unwrap();
        store
            .set("other", Status::ToReview, &listing(2, &["https://y/1.jpg"]))
            .await
            .unwrap();

        let path = DocPath::parse("propertyData.images").unwrap();
        let fields = projections([(".url", "url")]).unwrap();
        let rows = store
            .project_array(&path, &fields, &[Filter::Key(KEY.to_string())])
            .await
            .unwrap();

        assert_eq!(rows, vec![doc(json!({ "url": "https://x/1.jpg" }))]);
    }

    #[tokio::test]
    async fn test_project_array_preserves_element_order() {
        let store = store().await;
        let urls = ["https://x/3.jpg", "https://x/1.jpg", "https://x/2.jpg"];
        store.set(KEY, Status::ToReview, &listing(1, &urls)).await.unwrap();

        let path = DocPath::parse("propertyData.images").unwrap();
        let fields = projections([(".url", "url"), ("key", "key")]).unwrap();
        let rows = store.project_array(&path, &fields, &[]).await.unwrap();

        let got: Vec<&str> = rows.iter().filter_map(|r| r["url"].as_str()).collect();
        assert_eq!(got, urls);
        assert!(rows.iter().all(|r| r["key"] == KEY));
    }

    #[tokio::test]
    async fn test_project_array_empty_or_absent_yields_no_rows() {
        let store = store().await;
        store.set("empty", Status::ToReview, &listing(1, &[])).await.unwrap();
        store
            .set("absent", Status::ToReview, &doc(json!({ "propertyData": { "id": 2 } })))
            .await
            .unwrap();

        let path = DocPath::parse("propertyData.images").unwrap();
        let fields = projections([(".url", "url")]).unwrap();

        for key in ["empty", "absent", "missing-record"] {
            let rows = store
                .project_array(&path, &fields, &[Filter::Key(key.to_string())])
                .await
                .unwrap();
            assert!(rows.is_empty(), "expected no rows for {key}");
        }
    }

    #[tokio::test]
    async fn test_project_array_scalar_elements() {
        let store = store().await;
        let document = doc(json!({ "photos": ["https://x/a.jpg", "https://x/b.jpg"] }));
        store.set(KEY, Status::ToReview, &document).await.unwrap();

        let path = DocPath::parse("photos").unwrap();
        let root = projections([(".", "url")]).unwrap();
        let rows = store.project_array(&path, &root, &[]).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["url"], "https://x/b.jpg");

        let nested = projections([(".url", "url")]).unwrap();
        let rows = store.project_array(&path, &nested, &[]).await.unwrap();
        assert!(rows.iter().all(|r| r["url"].is_null()));
    }

    #[tokio::test]
    async fn test_quoted_path_segments() {
        let store = store().await;
        let document = doc(json!({ "odd key": { "with-dash": 7 } }));
        store.set(KEY, Status::ToReview, &document).await.unwrap();

        let fields = projections([("odd key.with-dash", "value")]).unwrap();
        let rows = store.project(&fields, &[]).await.unwrap();
        assert_eq!(rows[0]["value"], 7);
    }

    #[tokio::test]
    async fn test_filter_values_are_bound() {
        let store = store().await;
        store.set(KEY, Status::ToReview, &listing(1, &[])).await.unwrap();

        let keys = projections([("key", "key")]).unwrap();
        let rows = store
            .project(&keys, &[Filter::Key("' OR '1'='1".to_string())])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("houses.db");

        let store = SqliteStore::open(&path, hosts()).await.unwrap();
        store.set(KEY, Status::ViewedYes, &listing(1, &[])).await.unwrap();
        store.close().await;

        let reopened = SqliteStore::open(&path, hosts()).await.unwrap();
        let record = reopened.get_record(KEY).await.unwrap().unwrap();
        assert_eq!(record.status, Status::ViewedYes);
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let store = store().await;
        store.close().await;
        assert!(matches!(
            store.get(KEY).await,
            Err(AppError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_locked_database_is_unavailable() {
        use sqlx::Connection;
        use sqlx::sqlite::SqliteConnection;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("houses.db");
        let store = SqliteStore::open(&path, hosts()).await.unwrap();

        let mut holder = SqliteConnection::connect_with(&SqliteConnectOptions::new().filename(&path))
            .await
            .unwrap();
        sqlx::query("BEGIN EXCLUSIVE").execute(&mut holder).await.unwrap();

        // Waits out the default busy timeout before reporting the lock.
        let locked = store.set(KEY, Status::ToReview, &listing(1, &[])).await;
        assert!(
            matches!(locked, Err(AppError::StorageUnavailable(_))),
            "got {locked:?}"
        );

        sqlx::query("ROLLBACK").execute(&mut holder).await.unwrap();
        store.set(KEY, Status::ToReview, &listing(1, &[])).await.unwrap();
        assert_eq!(store.count(&[]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_malformed_statement_is_query_error() {
        let store = store().await;
        let result = sqlx::query("SELECT missing_column FROM houses")
            .execute(&store.pool)
            .await;
        let error = AppError::from(result.unwrap_err());
        assert!(matches!(error, AppError::Query(_)), "got {error:?}");
    }

    #[tokio::test]
    async fn test_supports_by_host() {
        let store = store().await;
        assert!(store.supports("https://www.rightmove.co.uk/properties/1").unwrap());
        assert!(!store.supports("https://example.com/1").unwrap());
        assert!(store.supports("not a url").is_err());
    }
}
