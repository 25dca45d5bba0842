use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A single record: attribute name to value, in source order
pub type Record = Map<String, Value>;

/// The uncovered output: table name to its stripped records
///
/// Tables keep the order in which they were first created, and records keep
/// the order in which they were appended. Serializes as a plain JSON object
/// of arrays, e.g. `{"books": [...], "characters": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableCollection {
    tables: IndexMap<String, Vec<Record>>,
}

impl TableCollection {
    pub fn new() -> Self {
        TableCollection::default()
    }

    /// Get the table with the given name, creating an empty one if absent
    pub fn ensure_table(&mut self, name: &str) -> &mut Vec<Record> {
        self.tables.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(table = name, "creating table");
            Vec::new()
        })
    }

    /// Append a record to a table, creating the table if needed
    pub fn push(&mut self, name: &str, record: Record) {
        self.ensure_table(name).push(record);
    }

    pub fn get(&self, name: &str) -> Option<&[Record]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in creation order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of tables (not records)
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of records across all tables
    pub fn record_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Append every table of `other` onto this collection.
    ///
    /// Tables missing here are created in the order `other` created them.
    pub fn merge(&mut self, other: TableCollection) {
        for (name, records) in other.tables {
            self.ensure_table(&name).extend(records);
        }
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<Record>> {
        self.tables
    }

    /// Convert into a `serde_json::Value` object of arrays
    pub fn into_value(self) -> Value {
        let object: Map<String, Value> = self
            .tables
            .into_iter()
            .map(|(name, records)| {
                let rows = records.into_iter().map(Value::Object).collect();
                (name, Value::Array(rows))
            })
            .collect();
        Value::Object(object)
    }
}

impl From<IndexMap<String, Vec<Record>>> for TableCollection {
    fn from(tables: IndexMap<String, Vec<Record>>) -> Self {
        TableCollection { tables }
    }
}

impl IntoIterator for TableCollection {
    type Item = (String, Vec<Record>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

/// How an attribute value is treated when a record is stripped.
///
/// The decision is made once per value from its JSON variant. Arrays are
/// classified by their first element only.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// A nested object: a to-one relation, extracted
    Record(Record),
    /// An array whose first element is an object: a to-many relation, extracted
    Records(Vec<Value>),
    /// An array whose first element is not an object, kept in place
    Scalars(Vec<Value>),
    /// An empty array: element type unknown, kept in place and given a table
    Empty,
    /// Anything else, including null
    Scalar(Value),
}

impl Attribute {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(obj) => Attribute::Record(obj),
            Value::Array(arr) => match arr.first() {
                None => Attribute::Empty,
                Some(Value::Object(_)) => Attribute::Records(arr),
                Some(_) => Attribute::Scalars(arr),
            },
            other => Attribute::Scalar(other),
        }
    }

    /// Whether this attribute is pulled out into its own table
    pub fn is_nested(&self) -> bool {
        matches!(self, Attribute::Record(_) | Attribute::Records(_))
    }

    /// Turn the attribute back into the value it was classified from
    pub fn into_value(self) -> Value {
        match self {
            Attribute::Record(obj) => Value::Object(obj),
            Attribute::Records(arr) | Attribute::Scalars(arr) => Value::Array(arr),
            Attribute::Empty => Value::Array(Vec::new()),
            Attribute::Scalar(v) => v,
        }
    }
}

/// Configuration for the uncovering process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncoverConfig {
    /// Attributes to always keep in place (never extracted into tables)
    pub scalar_fields: Vec<String>,

    /// Maximum nesting depth to extract (root records are depth 0).
    /// Nested values below this depth stay on their owning record.
    /// `None` extracts at every depth.
    pub max_depth: Option<usize>,
}

impl UncoverConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub(crate) fn is_scalar_field(&self, field_name: &str) -> bool {
        self.scalar_fields.iter().any(|f| f == field_name)
    }

    pub(crate) fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_classify() {
        assert!(matches!(Attribute::classify(json!({"a": 1})), Attribute::Record(_)));
        assert!(matches!(Attribute::classify(json!([{"a": 1}])), Attribute::Records(_)));
        assert!(matches!(Attribute::classify(json!(["a", "b"])), Attribute::Scalars(_)));
        assert_eq!(Attribute::classify(json!([])), Attribute::Empty);
        assert_eq!(Attribute::classify(json!(null)), Attribute::Scalar(Value::Null));
        assert_eq!(Attribute::classify(json!("x")), Attribute::Scalar(json!("x")));

        // Only the first element decides
        assert!(matches!(Attribute::classify(json!([1, {"a": 1}])), Attribute::Scalars(_)));
        assert!(matches!(Attribute::classify(json!([[{"a": 1}]])), Attribute::Scalars(_)));
    }

    #[test]
    fn test_attribute_into_value() {
        let value = json!(["a", "b"]);
        assert_eq!(Attribute::classify(value.clone()).into_value(), value);
        assert_eq!(Attribute::Empty.into_value(), json!([]));
        assert!(Attribute::classify(json!({"a": 1})).is_nested());
        assert!(!Attribute::Empty.is_nested());
    }

    #[test]
    fn test_table_order_and_merge() {
        let mut tables = TableCollection::new();
        tables.ensure_table("books");
        tables.push("characters", record(json!({"name": "Baloo"})));
        tables.push("books", record(json!({"name": "Jungle Book"})));

        let names: Vec<&str> = tables.table_names().collect();
        assert_eq!(names, vec!["books", "characters"]);
        assert_eq!(tables.record_count(), 2);

        let mut other = TableCollection::new();
        other.push("animals", record(json!({"name": "Bear"})));
        other.push("books", record(json!({"name": "Kim"})));
        tables.merge(other);

        let names: Vec<&str> = tables.table_names().collect();
        assert_eq!(names, vec!["books", "characters", "animals"]);
        assert_eq!(tables.get("books").unwrap().len(), 2);
        assert_eq!(tables.get("books").unwrap()[1].get("name").unwrap(), "Kim");
    }

    #[test]
    fn test_serializes_as_object_of_arrays() {
        let mut tables = TableCollection::new();
        tables.ensure_table("tags");
        tables.push("items", record(json!({"name": "X"})));

        let expected = json!({"tags": [], "items": [{"name": "X"}]});
        assert_eq!(serde_json::to_value(&tables).unwrap(), expected);
        assert_eq!(tables.clone().into_value(), expected);

        let back: TableCollection = serde_json::from_value(expected).unwrap();
        assert_eq!(back, tables);
    }

    #[test]
    fn test_config_defaults() {
        let config: UncoverConfig = serde_json::from_str(r#"{"scalar_fields": ["meta"]}"#).unwrap();
        assert!(config.is_scalar_field("meta"));
        assert!(!config.is_scalar_field("name"));
        assert_eq!(config.max_depth, None);
        assert!(config.allows_depth(1000));

        let bounded = UncoverConfig { max_depth: Some(1), ..Default::default() };
        assert!(bounded.allows_depth(1));
        assert!(!bounded.allows_depth(2));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uncover.json");
        std::fs::write(&path, r#"{"max_depth": 3}"#).unwrap();

        let config = UncoverConfig::from_file(&path).unwrap();
        assert_eq!(config.max_depth, Some(3));
        assert!(config.scalar_fields.is_empty());

        std::fs::write(&path, "{}").unwrap();
        assert_eq!(UncoverConfig::from_file(&path).unwrap(), UncoverConfig::default());
    }

    #[test]
    fn test_config_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = UncoverConfig::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"max_depth": "deep"}"#).unwrap();
        let err = UncoverConfig::from_file(&bad).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
