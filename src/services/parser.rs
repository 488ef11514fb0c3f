// src/services/parser.rs

//! Content parsers.
//!
//! Listing pages embed their data as `window.<NAME> = {...}` assignments in
//! a `<script>` block. The parser locates the block for its marker and
//! decodes the object literal as JSON.

use std::collections::BTreeMap;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Document, DocumentShape};
use crate::utils::scan::{find_block, find_blocks};
use crate::utils::url::check_host_in;

/// Trait for turning raw page content into a listing document.
pub trait PropertyParser: Send + Sync {
    /// Whether this parser handles pages from the URL's host.
    fn supports(&self, url: &str) -> Result<bool>;

    /// Shape of the documents this parser yields.
    fn shape(&self) -> DocumentShape;

    /// Decode one listing document from raw content.
    fn parse(&self, content: &str) -> Result<Document>;
}

/// Parser for a named `window.<NAME> = {...}` page model.
#[derive(Debug, Clone)]
pub struct PageModelParser {
    hosts: Vec<String>,
    marker: String,
    shape: DocumentShape,
}

impl PageModelParser {
    pub fn new(hosts: Vec<String>, marker: impl Into<String>, shape: DocumentShape) -> Self {
        Self {
            hosts,
            marker: marker.into(),
            shape,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Object literal text for this parser's marker.
    ///
    /// `<script>` bodies are searched first; the raw content is the fallback
    /// for fragments that carry no script element.
    fn locate(&self, content: &str) -> Option<String> {
        script_texts(content)
            .iter()
            .find_map(|script| find_block(script, &self.marker).map(str::to_string))
            .or_else(|| find_block(content, &self.marker).map(str::to_string))
    }
}

impl PropertyParser for PageModelParser {
    fn supports(&self, url: &str) -> Result<bool> {
        check_host_in(url, &self.hosts)
    }

    fn shape(&self) -> DocumentShape {
        self.shape
    }

    fn parse(&self, content: &str) -> Result<Document> {
        let body = self
            .locate(content)
            .ok_or_else(|| AppError::parse(&self.marker, "Couldn't locate page model"))?;

        let document = decode(&body).map_err(|message| AppError::parse(&self.marker, message))?;
        log::debug!(
            "Parsed window.{} with {} top-level keys",
            self.marker,
            document.len()
        );
        Ok(document)
    }
}

fn decode(body: &str) -> std::result::Result<Document, String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(format!("expected an object, found {other}")),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn script_texts(content: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("script") else {
        return Vec::new();
    };
    Html::parse_document(content)
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .filter(|text| text.contains("window."))
        .collect()
}

/// Decode every `window.<NAME> = {...}` block found in the content.
///
/// Blocks that are not valid JSON objects are logged and skipped.
pub fn extract_models(content: &str) -> BTreeMap<String, Document> {
    let scripts = script_texts(content);
    let sources: Vec<&str> = if scripts.is_empty() {
        vec![content]
    } else {
        scripts.iter().map(String::as_str).collect()
    };

    let mut models = BTreeMap::new();
    for source in sources {
        for block in find_blocks(source) {
            match decode(block.body) {
                Ok(document) => {
                    models.insert(block.name.to_string(), document);
                }
                Err(message) => log::warn!("Failed to parse {}: {}", block.name, message),
            }
        }
    }
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PageModelParser {
        PageModelParser::new(
            vec!["www.rightmove.co.uk".to_string()],
            "PAGE_MODEL",
            DocumentShape::RightmovePageModel,
        )
    }

    const PAGE: &str = r#"
        <html><head>
        <script>window.dataLayer = {"event": "load"};</script>
        </head><body>
        <script>
            window.adInfo = {"slots": [1, 2]};
            window.PAGE_MODEL = {"propertyData": {"id": 163179074, "images":[{"url":"https://x/1.jpg"}]}}
        </script>
        </body></html>
    "#;

    #[test]
    fn test_parse_page_model() {
        let document = parser().parse(PAGE).unwrap();
        assert_eq!(document["propertyData"]["id"], 163179074);
        assert_eq!(document["propertyData"]["images"][0]["url"], "https://x/1.jpg");
    }

    #[test]
    fn test_parse_bare_fragment() {
        let content = r#"window.PAGE_MODEL = {"propertyData": {"id": 1}}"#;
        let document = parser().parse(content).unwrap();
        assert_eq!(document["propertyData"]["id"], 1);
    }

    #[test]
    fn test_parse_missing_marker() {
        let content = r#"<script>window.adInfo = {"a": 1};</script>"#;
        match parser().parse(content) {
            Err(AppError::Parse { marker, .. }) => assert_eq!(marker, "PAGE_MODEL"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_malformed_payload() {
        let content = r#"<script>window.PAGE_MODEL = {propertyData: undefined}</script>"#;
        assert!(matches!(
            parser().parse(content),
            Err(AppError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_decodes_entities_free_script_text() {
        let content = r#"<script>window.PAGE_MODEL = {"text": "a &amp; b </p>"}</script>"#;
        let document = parser().parse(content).unwrap();
        assert_eq!(document["text"], "a &amp; b </p>");
    }

    #[test]
    fn test_extract_models_skips_invalid() {
        let content = r#"
            <script>
            window.GOOD = {"a": 1};
            window.BAD = {a: 1};
            </script>
            <script>window.PAGE_MODEL = {"b": 2};</script>
        "#;
        let models = extract_models(content);
        assert_eq!(
            models.keys().collect::<Vec<_>>(),
            ["GOOD", "PAGE_MODEL"]
        );
    }

    #[test]
    fn test_supports_and_shape() {
        let parser = parser();
        assert!(parser.supports("https://www.rightmove.co.uk/properties/1").unwrap());
        assert!(!parser.supports("https://www.zoopla.co.uk/").unwrap());
        assert_eq!(parser.shape(), DocumentShape::RightmovePageModel);
    }
}
