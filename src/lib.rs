//! # Uncover - JSON Normalization
//!
//! Flattens nested JSON records into per-entity tables, the way a nested API
//! response is normalized into one array per entity type, and indexes those
//! tables into `{ key -> record }` maps.
//!
//! ## Modules
//!
//! - **normalize**: uncover nested JSON into tables, index tables, write them out
//!
//! ## Quick Start
//!
//! ### Uncovering
//!
//! ```rust
//! use uncover::uncover;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let book = json!({
//!     "name": "Jungle Book",
//!     "keywords": ["test", "..."],
//!     "animals": [
//!         {"name": "Bear", "character": {"name": "Baloo"}},
//!         {"name": "Wolf", "characters": [{"name": "Akela"}, {"name": "Rama"}]}
//!     ]
//! });
//!
//! let tables = uncover(book, "book")?;
//!
//! assert_eq!(tables.into_value(), json!({
//!     "books": [{"name": "Jungle Book", "keywords": ["test", "..."]}],
//!     "animals": [{"name": "Bear"}, {"name": "Wolf"}],
//!     "characters": [{"name": "Baloo"}, {"name": "Akela"}, {"name": "Rama"}]
//! }));
//! # Ok(())
//! # }
//! ```
//!
//! ### Indexing
//!
//! ```rust
//! use uncover::{to_map, uncover};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let tables = uncover(json!([{"id": 1, "v": "a"}]), "items")?;
//!
//! let map = to_map(Some(&tables), "items")?.expect("items table exists");
//! assert_eq!(map["1"]["v"], "a");
//!
//! // Unknown tables are "no data", not an error
//! assert!(to_map(Some(&tables), "others")?.is_none());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::BufRead;

pub mod error;
pub mod normalize;

// Re-export commonly used types for convenience
pub use error::UncoverError;
pub use normalize::{
    key_by, to_map, to_map_with, uncover, English, Index, KeyMap, Pluralize, Record,
    SingleWriter, TableCollection, TableWriter, UncoverConfig, Uncoverer,
};

/// Stream entry point: uncover newline-delimited JSON into one table collection.
///
/// Every line is uncovered under `name` and appended to the same tables.
/// Blank lines are skipped.
pub fn uncover_json<R: BufRead>(reader: R, name: &str, config: UncoverConfig) -> Result<TableCollection> {
    let uncoverer = Uncoverer::new(config);
    let mut tables = TableCollection::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse JSON on line {}", line_no + 1))?;

        uncoverer.uncover_extend(value, name, &mut tables)?;
    }

    tracing::debug!(
        tables = tables.len(),
        records = tables.record_count(),
        "uncovered stream"
    );
    Ok(tables)
}

/// Parse one JSON document, SIMD first with a `serde_json` fallback.
///
/// simd-json parses in place and may leave the buffer modified on failure,
/// so the fallback works from a copy of the original bytes.
pub fn parse_document(mut content: Vec<u8>) -> Result<Value> {
    let original = content.clone();

    match simd_json::serde::from_slice::<Value>(&mut content) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::debug!(error = %err, "simd-json rejected input, retrying with serde_json");
            serde_json::from_slice(&original).context("Failed to parse JSON")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_basic_uncover() {
        let input = json!({
            "id": 1,
            "name": "Alice",
            "posts": [
                {"id": 10, "title": "Post 1"},
                {"id": 11, "title": "Post 2"}
            ]
        });

        let tables = uncover(input, "user").unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables.get("users").unwrap().len(), 1);
        assert_eq!(tables.get("posts").unwrap().len(), 2);

        let posts = to_map(Some(&tables), "posts").unwrap().unwrap();
        assert_eq!(posts["11"]["title"], "Post 2");
    }

    #[test]
    fn test_uncover_json_stream() {
        let input = concat!(
            r#"{"id": 1, "author": {"id": 7}}"#, "\n",
            "\n",
            r#"{"id": 2, "author": {"id": 8}, "tags": []}"#, "\n",
        );

        let tables = uncover_json(Cursor::new(input), "post", UncoverConfig::default()).unwrap();

        assert_eq!(
            tables.into_value(),
            json!({
                "posts": [{"id": 1}, {"id": 2, "tags": []}],
                "authors": [{"id": 7}, {"id": 8}],
                "tags": []
            })
        );
    }

    #[test]
    fn test_parse_document() {
        let value = parse_document(br#"{"b": 1, "a": [{"c": null}]}"#.to_vec()).unwrap();
        assert_eq!(value, json!({"b": 1, "a": [{"c": null}]}));

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);

        let value = parse_document(b"  [1, 2]\n".to_vec()).unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn test_parse_document_errors() {
        let err = parse_document(b"{not json}".to_vec()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));

        let err = parse_document(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_uncover_json_errors() {
        let err = uncover_json(Cursor::new("{\"id\": 1}\n"), "", UncoverConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UncoverError>(),
            Some(UncoverError::InvalidArgument(_))
        ));

        let err = uncover_json(Cursor::new("{not json}\n"), "post", UncoverConfig::default()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
