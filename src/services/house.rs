// src/services/house.rs

//! Acquisition service.
//!
//! Orchestrates site → fetcher → parser → store for one listing at a time.
//! Fetchers, parsers and stores are chosen from ordered lists by their
//! `supports(url)` predicate; the first match wins, so registration order
//! matters.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{AppError, Result};
use crate::models::{
    Column, Config, DocPath, DocumentShape, Filter, ListingSummary, Projection, PropertyRecord,
    Status,
};
use crate::services::events::{EventBus, PropertyEvent};
use crate::services::fetcher::{FetchedItem, HttpFetcher, PropertyFetcher};
use crate::services::parser::{PageModelParser, PropertyParser};
use crate::sites::{PropertySite, Rightmove};
use crate::storage::{PropertyStore, SqliteStore};

/// Result for one id of a batch add.
#[derive(Debug)]
pub struct BatchItem {
    pub id: String,
    pub result: Result<PropertyRecord>,
}

/// Position of the first item whose predicate holds, or the typed "no match" error.
fn first_match_index<T: ?Sized>(
    items: &[Arc<T>],
    url: &str,
    matches: impl Fn(&T) -> Result<bool>,
    none: impl FnOnce(String) -> AppError,
) -> Result<usize> {
    for (index, item) in items.iter().enumerate() {
        if matches(item.as_ref())? {
            return Ok(index);
        }
    }
    Err(none(url.to_string()))
}

fn first_match<'a, T: ?Sized>(
    items: &'a [Arc<T>],
    url: &str,
    matches: impl Fn(&T) -> Result<bool>,
    none: impl FnOnce(String) -> AppError,
) -> Result<&'a T> {
    let index = first_match_index(items, url, matches, none)?;
    Ok(items[index].as_ref())
}

/// Service for acquiring, storing and triaging listings.
pub struct HouseService {
    sites: Vec<Arc<dyn PropertySite>>,
    fetchers: Vec<Arc<dyn PropertyFetcher>>,
    parsers: Vec<Arc<dyn PropertyParser>>,
    stores: Vec<Arc<dyn PropertyStore>>,
    events: EventBus,
}

impl HouseService {
    /// Create a service over ordered component lists.
    pub fn new(
        sites: Vec<Arc<dyn PropertySite>>,
        fetchers: Vec<Arc<dyn PropertyFetcher>>,
        parsers: Vec<Arc<dyn PropertyParser>>,
        stores: Vec<Arc<dyn PropertyStore>>,
    ) -> Self {
        Self {
            sites,
            fetchers,
            parsers,
            stores,
            events: EventBus::new(),
        }
    }

    /// Wire the Rightmove site, fetcher, parser and the configured store.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let hosts = config.rightmove.hosts.clone();
        let fetcher = HttpFetcher::new(&config.fetcher, hosts.clone())?;
        let parser = PageModelParser::new(
            hosts.clone(),
            config.rightmove.marker.clone(),
            DocumentShape::RightmovePageModel,
        );
        let store = SqliteStore::open(&config.store.path, hosts).await?;
        log::info!("Opened store at {}", config.store.path.display());

        Ok(Self::new(
            vec![Arc::new(Rightmove)],
            vec![Arc::new(fetcher)],
            vec![Arc::new(parser)],
            vec![Arc::new(store)],
        ))
    }

    /// Receive selection and list change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyEvent> {
        self.events.subscribe()
    }

    // --- Component resolution ---

    pub fn site(&self, site_name: &str) -> Result<&dyn PropertySite> {
        self.sites
            .iter()
            .find(|site| site.name() == site_name)
            .map(|site| site.as_ref())
            .ok_or_else(|| AppError::UnknownSite(site_name.to_string()))
    }

    fn fetcher(&self, url: &str) -> Result<&dyn PropertyFetcher> {
        first_match(&self.fetchers, url, |f| f.supports(url), AppError::NoFetcher)
    }

    fn parser(&self, url: &str, shape: DocumentShape) -> Result<&dyn PropertyParser> {
        first_match(
            &self.parsers,
            url,
            |p| Ok(p.shape() == shape && p.supports(url)?),
            AppError::NoParser,
        )
    }

    fn store(&self, url: &str) -> Result<&dyn PropertyStore> {
        first_match(&self.stores, url, |s| s.supports(url), AppError::NoStore)
    }

    fn store_for_shape(&self, url: &str, shape: DocumentShape) -> Result<&dyn PropertyStore> {
        first_match(
            &self.stores,
            url,
            |s| Ok(s.accepts(shape) && s.supports(url)?),
            AppError::NoStore,
        )
    }

    /// Canonical URL (and store key) for a listing id.
    pub fn property_url(&self, site_name: &str, property_id: &str) -> Result<String> {
        Ok(self.site(site_name)?.property_url(property_id))
    }

    // --- Acquisition ---

    /// Return the stored listing, fetching and storing it on a miss.
    pub async fn get_property(&self, site_name: &str, property_id: &str) -> Result<PropertyRecord> {
        let site = self.site(site_name)?;
        let url = site.property_url(property_id);

        let store = self.store_for_shape(&url, site.shape())?;
        if let Some(record) = store.get_record(&url).await? {
            log::debug!("Store hit for {}", url);
            return Ok(record);
        }

        log::debug!("Store miss for {}", url);
        self.acquire(site, &url, Status::default()).await
    }

    /// Fetch, parse and store a listing, replacing any stored copy.
    pub async fn add_property(
        &self,
        site_name: &str,
        property_id: &str,
        status: Status,
    ) -> Result<PropertyRecord> {
        let site = self.site(site_name)?;
        let url = site.property_url(property_id);
        self.acquire(site, &url, status).await
    }

    /// Add several listings. Each id succeeds or fails on its own.
    pub async fn add_properties<S: AsRef<str>>(
        &self,
        site_name: &str,
        property_ids: &[S],
        status: Status,
    ) -> Vec<BatchItem> {
        let mut items = Vec::with_capacity(property_ids.len());
        for id in property_ids {
            let id = id.as_ref();
            let result = self.add_property(site_name, id, status).await;
            match &result {
                Ok(record) => log::info!("Data saved for {} ({})", id, record.key),
                Err(e) => log::warn!("Failed: {}: {}", id, e),
            }
            items.push(BatchItem {
                id: id.to_string(),
                result,
            });
        }
        items
    }

    async fn acquire(
        &self,
        site: &dyn PropertySite,
        url: &str,
        status: Status,
    ) -> Result<PropertyRecord> {
        let shape = site.shape();
        let fetcher = self.fetcher(url)?;
        let parser = self.parser(url, shape)?;
        let store = self.store_for_shape(url, shape)?;

        let content = fetcher.fetch(url).await?;
        let document = parser.parse(&content)?;

        let previous = store.get_record(url).await?.map(|record| record.status);
        store.set(url, status, &document).await?;
        log::info!("Stored {} as {}", url, status);

        if let Some(previous) = previous.filter(|p| *p != status) {
            self.events.emit(PropertyEvent::ListChanged { status: previous });
        }
        self.events.emit(PropertyEvent::ListChanged { status });

        store
            .get_record(url)
            .await?
            .ok_or_else(|| AppError::StorageUnavailable(format!("{url} missing after write")))
    }

    // --- Triage ---

    /// Display rows for every listing of a site in one status bucket.
    pub async fn list_by_status(&self, site_name: &str, status: Status) -> Result<Vec<ListingSummary>> {
        let site = self.site(site_name)?;
        let shape = site.shape();
        let store = self.store_for_shape(&site.home_url(), shape)?;

        let projections = [
            Projection::column(Column::Key, "key")?,
            Projection::path(shape.id_path(), "id")?,
            Projection::path(shape.description_path(), "description")?,
            Projection::path(shape.address_path(), "address")?,
            Projection::path(shape.price_path(), "price")?,
        ];
        let rows = store.project(&projections, &[Filter::Status(status)]).await?;

        rows.into_iter()
            .map(|row| Ok(serde_json::from_value(Value::Object(row))?))
            .collect()
    }

    /// Move a listing to another bucket. Moving to the current bucket is a no-op.
    pub async fn move_property(&self, key: &str, status: Status) -> Result<String> {
        let store = self.store(key)?;
        let previous = store.get_record(key).await?.map(|record| record.status);

        log::info!("Moving {} to {}", key, status);
        store.update_status(key, status).await?;

        if let Some(previous) = previous.filter(|p| *p != status) {
            self.events.emit(PropertyEvent::ListChanged { status: previous });
        }
        self.events.emit(PropertyEvent::ListChanged { status });
        Ok(key.to_string())
    }

    /// Remove a listing. Absent keys are not an error.
    pub async fn delete_property(&self, key: &str) -> Result<String> {
        let store = self.store(key)?;
        let previous = store.get_record(key).await?.map(|record| record.status);
        store.delete(key).await?;

        if let Some(status) = previous {
            self.events.emit(PropertyEvent::ListChanged { status });
        }
        Ok(key.to_string())
    }

    /// Announce that a listing was selected.
    pub fn select_property(&self, key: &str) {
        self.events.emit(PropertyEvent::SelectionChanged {
            key: key.to_string(),
        });
    }

    // --- Images ---

    /// Image URLs of a stored listing, in document order.
    pub async fn image_urls(&self, site_name: &str, key: &str) -> Result<Vec<String>> {
        let shape = self.site(site_name)?.shape();
        let store = self.store_for_shape(key, shape)?;

        let images = DocPath::parse(shape.images_path())?;
        let url = [Projection::path(shape.image_url_path(), "url")?];
        let rows = store
            .project_array(&images, &url, &[Filter::Key(key.to_string())])
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.get("url") {
                Some(Value::String(url)) => Some(url.clone()),
                _ => None,
            })
            .collect())
    }

    /// Fetch a listing's images concurrently, yielding in completion order.
    ///
    /// Each URL is routed to its own fetcher; a URL no fetcher accepts is
    /// reported as a failed item rather than failing the whole stream.
    pub async fn fetch_images(
        &self,
        site_name: &str,
        key: &str,
    ) -> Result<BoxStream<'static, FetchedItem>> {
        let urls = self.image_urls(site_name, key).await?;

        let mut groups: Vec<Vec<String>> = vec![Vec::new(); self.fetchers.len()];
        let mut unroutable = Vec::new();
        for url in urls {
            match first_match_index(&self.fetchers, &url, |f| f.supports(&url), AppError::NoFetcher) {
                Ok(index) => groups[index].push(url),
                Err(error) => {
                    log::warn!("Skipping image {}: {}", url, error);
                    unroutable.push(FetchedItem {
                        url,
                        result: Err(error),
                    });
                }
            }
        }

        let mut streams: Vec<BoxStream<'static, FetchedItem>> = vec![stream::iter(unroutable).boxed()];
        for (fetcher, urls) in self.fetchers.iter().zip(groups) {
            if !urls.is_empty() {
                streams.push(fetcher.fetch_many(urls));
            }
        }
        Ok(stream::select_all(streams).boxed())
    }
}
