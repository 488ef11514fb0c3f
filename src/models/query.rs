// src/models/query.rs

//! Projection and filter descriptions for document queries.
//!
//! Paths are dotted (`propertyData.images`); a leading dot marks a path
//! relative to the current root (`.url` inside an array element). Paths are
//! rendered as quoted JSON path expressions and always bound as statement
//! parameters, never spliced into SQL text.

use std::fmt;

use crate::error::{AppError, Result};

use super::Status;

const SEPARATOR: char = '.';

/// A dotted path into a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// The document root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path. Leading and trailing separators are ignored.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim().trim_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(trimmed.split(SEPARATOR))
    }

    /// Build a path from individual keys.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|segment| {
                let segment = segment.as_ref();
                validate_segment(segment)?;
                Ok(segment.to_string())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render as an SQLite JSON path with every key quoted, e.g. `$."a"."b"`.
    pub fn to_json_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.segments {
            out.push_str(".\"");
            out.push_str(segment);
            out.push('"');
        }
        out
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(AppError::query("empty path segment"));
    }
    if segment.contains(SEPARATOR) {
        return Err(AppError::query(format!(
            "path segment '{segment}' contains the path separator"
        )));
    }
    if segment.contains('"') || segment.chars().any(char::is_control) {
        return Err(AppError::query(format!(
            "path segment '{segment}' contains a quote or control character"
        )));
    }
    Ok(())
}

/// Top-level record columns that can be projected or filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Key,
    Status,
    UpdatedAt,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Key => "key",
            Column::Status => "status",
            Column::UpdatedAt => "updated_at",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "key" => Ok(Column::Key),
            "status" => Ok(Column::Status),
            "updated_at" => Ok(Column::UpdatedAt),
            other => Err(AppError::query(format!("unknown column: {other}"))),
        }
    }
}

/// Where a projected value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Column(Column),
    Path(DocPath),
}

/// One output field of a projection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub source: Source,
    pub name: String,
}

impl Projection {
    /// Parse a `(path, name)` pair. Paths containing a separator address the
    /// document; bare names address a top-level column.
    pub fn parse(path: &str, name: &str) -> Result<Self> {
        let source = if path.contains(SEPARATOR) {
            Source::Path(DocPath::parse(path)?)
        } else {
            Source::Column(Column::from_name(path.trim())?)
        };
        Self::new(source, name)
    }

    pub fn column(column: Column, name: &str) -> Result<Self> {
        Self::new(Source::Column(column), name)
    }

    pub fn path(path: &str, name: &str) -> Result<Self> {
        Self::new(Source::Path(DocPath::parse(path)?), name)
    }

    fn new(source: Source, name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AppError::query("projection output name is empty"));
        }
        Ok(Self {
            source,
            name: name.to_string(),
        })
    }
}

/// Parse a list of `(path, name)` pairs.
pub fn projections<'a, I>(pairs: I) -> Result<Vec<Projection>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(path, name)| Projection::parse(path, name))
        .collect()
}

/// Equality filter on a top-level record column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Key(String),
    Status(Status),
}

impl Filter {
    pub fn column(&self) -> Column {
        match self {
            Filter::Key(_) => Column::Key,
            Filter::Status(_) => Column::Status,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Filter::Key(key) => key,
            Filter::Status(status) => status.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_path() {
        let path = DocPath::parse("propertyData.images").unwrap();
        assert_eq!(path.segments(), ["propertyData", "images"]);
        assert_eq!(path.to_json_path(), r#"$."propertyData"."images""#);
    }

    #[test]
    fn test_parse_relative_path() {
        let path = DocPath::parse(".url").unwrap();
        assert_eq!(path.to_json_path(), r#"$."url""#);
    }

    #[test]
    fn test_parse_root() {
        assert!(DocPath::parse(".").unwrap().is_root());
        assert_eq!(DocPath::root().to_json_path(), "$");
    }

    #[test]
    fn test_empty_inner_segment_rejected() {
        assert!(matches!(
            DocPath::parse("propertyData..images"),
            Err(AppError::Query(_))
        ));
    }

    #[test]
    fn test_segment_with_separator_rejected() {
        let result = DocPath::from_segments(["propertyData", "images.url"]);
        assert!(matches!(result, Err(AppError::Query(_))));
    }

    #[test]
    fn test_segment_with_quote_rejected() {
        let result = DocPath::from_segments(["a\"b"]);
        assert!(matches!(result, Err(AppError::Query(_))));
    }

    #[test]
    fn test_projection_column_or_path() {
        let key = Projection::parse("key", "property_number").unwrap();
        assert_eq!(key.source, Source::Column(Column::Key));

        let id = Projection::parse("propertyData.id", "id").unwrap();
        assert!(matches!(id.source, Source::Path(_)));
    }

    #[test]
    fn test_projection_unknown_column_rejected() {
        assert!(Projection::parse("price", "price").is_err());
        assert!(Projection::parse("key", " ").is_err());
    }

    #[test]
    fn test_filter_values() {
        assert_eq!(Filter::Status(Status::ToView).value(), "to-view");
        assert_eq!(Filter::Key("1".to_string()).column(), Column::Key);
    }
}
