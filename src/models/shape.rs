// src/models/shape.rs

use serde::{Deserialize, Serialize};

/// Document shape a site produces and a parser yields.
///
/// The shape owns the dotted paths the core uses to read a document, so
/// stores never need a fixed schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentShape {
    /// `window.PAGE_MODEL` object embedded in a Rightmove property page
    RightmovePageModel,
}

impl DocumentShape {
    /// Path to the listing's stable identifier.
    pub fn id_path(&self) -> &'static str {
        match self {
            DocumentShape::RightmovePageModel => "propertyData.id",
        }
    }

    pub fn description_path(&self) -> &'static str {
        match self {
            DocumentShape::RightmovePageModel => "propertyData.text.description",
        }
    }

    pub fn address_path(&self) -> &'static str {
        match self {
            DocumentShape::RightmovePageModel => "propertyData.address.displayAddress",
        }
    }

    pub fn price_path(&self) -> &'static str {
        match self {
            DocumentShape::RightmovePageModel => "propertyData.prices.primaryPrice",
        }
    }

    /// Path to the array of image descriptors.
    pub fn images_path(&self) -> &'static str {
        match self {
            DocumentShape::RightmovePageModel => "propertyData.images",
        }
    }

    /// Path to the URL inside one image descriptor.
    pub fn image_url_path(&self) -> &'static str {
        match self {
            DocumentShape::RightmovePageModel => ".url",
        }
    }
}
