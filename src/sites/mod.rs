//! Site descriptors: map a site's listing id to its canonical URL.

mod rightmove;

pub use rightmove::Rightmove;

use crate::models::DocumentShape;

/// Stateless description of one listings website.
pub trait PropertySite: Send + Sync {
    /// Name callers use to address the site, e.g. `rightmove`.
    fn name(&self) -> &str;

    /// Canonical URL of a single listing. Pure string construction.
    fn property_url(&self, property_id: &str) -> String;

    /// Site root, used to route site-wide queries to a store.
    fn home_url(&self) -> String;

    /// Shape of the documents this site's pages yield.
    fn shape(&self) -> DocumentShape;
}
