// src/sites/rightmove.rs

use crate::models::DocumentShape;

use super::PropertySite;

const BASE_URL: &str = "https://www.rightmove.co.uk";

/// rightmove.co.uk property pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rightmove;

impl PropertySite for Rightmove {
    fn name(&self) -> &str {
        "rightmove"
    }

    fn property_url(&self, property_id: &str) -> String {
        format!("{BASE_URL}/properties/{}", property_id.trim())
    }

    fn home_url(&self) -> String {
        format!("{BASE_URL}/")
    }

    fn shape(&self) -> DocumentShape {
        DocumentShape::RightmovePageModel
    }
}
