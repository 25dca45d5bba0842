use crate::error::UncoverError;
use crate::normalize::inflect::{English, Pluralize};
use crate::normalize::types::{Attribute, Record, TableCollection, UncoverConfig};
use serde_json::{Map, Value};

/// The core normalizer that flattens nested JSON into entity tables
pub struct Uncoverer<P = English> {
    config: UncoverConfig,
    pluralizer: P,
}

impl Default for Uncoverer {
    fn default() -> Self {
        Uncoverer::new(UncoverConfig::default())
    }
}

impl Uncoverer {
    pub fn new(config: UncoverConfig) -> Self {
        Uncoverer {
            config,
            pluralizer: English,
        }
    }
}

impl<P: Pluralize> Uncoverer<P> {
    /// Use a custom pluralizer for singular table names
    pub fn with_pluralizer(config: UncoverConfig, pluralizer: P) -> Self {
        Uncoverer { config, pluralizer }
    }

    pub fn config(&self) -> &UncoverConfig {
        &self.config
    }

    /// Uncover a record or array of records into a fresh table collection.
    ///
    /// A single record is stored under the plural of `name`; an array is
    /// stored under `name` as given. Only an empty `name` is rejected.
    pub fn uncover(&self, body: Value, name: &str) -> Result<TableCollection, UncoverError> {
        if name.is_empty() {
            return Err(UncoverError::missing_name("uncover", "the root records"));
        }

        let mut tables = TableCollection::new();
        self.uncover_into(body, name, 0, &mut tables);
        Ok(tables)
    }

    /// Uncover `body` into an existing collection, appending to its tables
    pub fn uncover_extend(
        &self,
        body: Value,
        name: &str,
        tables: &mut TableCollection,
    ) -> Result<(), UncoverError> {
        if name.is_empty() {
            return Err(UncoverError::missing_name("uncover", "the root records"));
        }

        self.uncover_into(body, name, 0, tables);
        Ok(())
    }

    /// Recursively uncover a value under the given table name
    fn uncover_into(&self, body: Value, name: &str, depth: usize, tables: &mut TableCollection) {
        let (records, table_name) = match body {
            Value::Array(arr) => (arr, name.to_string()),
            single => (vec![single], self.pluralizer.pluralize(name)),
        };

        tables.ensure_table(&table_name);

        for item in records {
            let stripped = match item {
                Value::Object(obj) => self.strip_record(obj, depth, tables),
                // Non-records carry no attributes
                _ => Map::new(),
            };
            tables.push(&table_name, stripped);
        }
    }

    /// Remove nested records from `obj`, uncovering each into its own table
    fn strip_record(&self, obj: Record, depth: usize, tables: &mut TableCollection) -> Record {
        let mut stripped = Map::new();
        let extract = self.config.allows_depth(depth + 1);

        for (key, value) in obj.into_iter() {
            if !extract || self.config.is_scalar_field(&key) {
                stripped.insert(key, value);
                continue;
            }

            match Attribute::classify(value) {
                Attribute::Record(nested) => {
                    tracing::trace!(attribute = %key, depth, "extracting nested record");
                    self.uncover_into(Value::Object(nested), &key, depth + 1, tables);
                }
                Attribute::Records(nested) => {
                    tracing::trace!(attribute = %key, depth, count = nested.len(), "extracting nested records");
                    self.uncover_into(Value::Array(nested), &key, depth + 1, tables);
                }
                Attribute::Empty => {
                    // Could hold records or scalars: keep it and give it a table
                    tables.ensure_table(&key);
                    stripped.insert(key, Value::Array(Vec::new()));
                }
                kept => {
                    stripped.insert(key, kept.into_value());
                }
            }
        }

        stripped
    }
}

/// Uncover `body` under `name` with the default configuration
pub fn uncover(body: Value, name: &str) -> Result<TableCollection, UncoverError> {
    Uncoverer::default().uncover(body, name)
}
