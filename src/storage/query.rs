// src/storage/query.rs

//! SQL generation for projection queries.
//!
//! Each projected row is assembled by `json_object` inside SQLite, so path
//! extraction happens in the engine and the caller decodes one small JSON
//! object per row. Every path, output name and filter value is a bound
//! parameter; only fixed column names appear in the statement text.

use crate::error::{AppError, Result};
use crate::models::{Column, DocPath, Filter, Projection, Source};

pub(crate) const TABLE: &str = "houses";

/// A statement plus its positional parameters, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

fn column_sql(column: Column) -> String {
    format!("{TABLE}.\"{}\"", column.as_str())
}

/// Render one `json_object` argument pair. `root` is the JSON expression that
/// document paths are evaluated against.
fn projection_sql(projection: &Projection, root: &Root, params: &mut Vec<String>) -> String {
    params.push(projection.name.clone());
    let value = match &projection.source {
        Source::Column(column) => column_sql(*column),
        Source::Path(path) => root.extract(path, params),
    };
    format!("?, {value}")
}

enum Root {
    /// The record's `data` column
    Document,
    /// The `value` column of a `json_each` expansion
    Element,
}

impl Root {
    fn extract(&self, path: &DocPath, params: &mut Vec<String>) -> String {
        match self {
            Root::Document => {
                params.push(path.to_json_path());
                format!("json_extract({TABLE}.data, ?)")
            }
            // Scalar elements are not JSON text, so only the root path applies to them.
            Root::Element if path.is_root() => "elem.value".to_string(),
            Root::Element => {
                params.push(path.to_json_path());
                "CASE WHEN elem.type IN ('object', 'array') \
                 THEN json_extract(elem.value, ?) END"
                    .to_string()
            }
        }
    }
}

fn select_list(projections: &[Projection], root: &Root, params: &mut Vec<String>) -> Result<String> {
    if projections.is_empty() {
        return Err(AppError::query("at least one projection is required"));
    }
    let args: Vec<String> = projections
        .iter()
        .map(|projection| projection_sql(projection, root, params))
        .collect();
    Ok(format!("json_object({})", args.join(", ")))
}

fn where_clause(filters: &[Filter], params: &mut Vec<String>) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let clauses: Vec<String> = filters
        .iter()
        .map(|filter| {
            params.push(filter.value().to_string());
            format!("{} = ?", column_sql(filter.column()))
        })
        .collect();
    format!(" WHERE {}", clauses.join(" AND "))
}

/// `SELECT json_object(...) FROM houses [WHERE ...]`
pub(crate) fn atomic(projections: &[Projection], filters: &[Filter]) -> Result<Statement> {
    let mut params = Vec::new();
    let columns = select_list(projections, &Root::Document, &mut params)?;
    let filter = where_clause(filters, &mut params);
    Ok(Statement {
        sql: format!("SELECT {columns} FROM {TABLE}{filter} ORDER BY {TABLE}.rowid"),
        params,
    })
}

/// `SELECT json_object(...) FROM houses, json_each(houses.data, ?) [WHERE ...]`
pub(crate) fn array(
    array_path: &DocPath,
    projections: &[Projection],
    filters: &[Filter],
) -> Result<Statement> {
    if array_path.is_root() {
        return Err(AppError::query("array path must name a field"));
    }
    let mut params = Vec::new();
    let columns = select_list(projections, &Root::Element, &mut params)?;
    params.push(array_path.to_json_path());
    let filter = where_clause(filters, &mut params);
    Ok(Statement {
        sql: format!(
            "SELECT {columns} FROM {TABLE}, json_each({TABLE}.data, ?) AS elem{filter} \
             ORDER BY {TABLE}.rowid, elem.id"
        ),
        params,
    })
}

/// `SELECT COUNT(*) FROM houses [WHERE ...]`
pub(crate) fn count(filters: &[Filter]) -> Statement {
    let mut params = Vec::new();
    let filter = where_clause(filters, &mut params);
    Statement {
        sql: format!("SELECT COUNT(*) FROM {TABLE}{filter}"),
        params,
    }
}
