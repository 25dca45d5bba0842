//! Turn an uncovered table into a `{ key -> record }` lookup map
//!
//! The fold is driven by a combiner `(map, record) -> Option<map>`. Returning
//! `None` keeps the (mutated) accumulator; returning `Some(map)` replaces it,
//! which allows immutable-style folds that build a fresh map every step.

use crate::error::UncoverError;
use crate::normalize::types::{Record, TableCollection};
use serde_json::{Map, Value};

/// The accumulator of an index fold
pub type KeyMap = Map<String, Value>;

type Combiner<'a> = Box<dyn FnMut(&mut KeyMap, &Record) -> Option<KeyMap> + 'a>;

/// Attribute used as the key by default
pub const DEFAULT_KEY: &str = "id";

/// Builder for indexing one table of a [`TableCollection`]
///
/// ```rust
/// use uncover::{uncover, Index};
/// use serde_json::json;
///
/// let tables = uncover(json!([{"slug": "a", "v": 1}]), "items").unwrap();
/// let map = Index::new("items").key("slug").build(Some(&tables)).unwrap().unwrap();
/// assert_eq!(map["a"]["v"], 1);
/// ```
pub struct Index<'a> {
    name: String,
    key: String,
    combiner: Option<Combiner<'a>>,
    initial: Option<KeyMap>,
}

impl<'a> Index<'a> {
    /// Index the table called `name`, keyed by `id`
    pub fn new(name: impl Into<String>) -> Self {
        Index {
            name: name.into(),
            key: DEFAULT_KEY.to_string(),
            combiner: None,
            initial: None,
        }
    }

    /// Key records by another attribute. Ignored when a combiner is set.
    pub fn key(mut self, attr: impl Into<String>) -> Self {
        self.key = attr.into();
        self
    }

    /// Fold records with a custom combiner
    pub fn combiner<F>(mut self, combiner: F) -> Self
    where
        F: FnMut(&mut KeyMap, &Record) -> Option<KeyMap> + 'a,
    {
        self.combiner = Some(Box::new(combiner));
        self
    }

    /// Start the fold from an existing map instead of an empty one
    pub fn initial(mut self, map: KeyMap) -> Self {
        self.initial = Some(map);
        self
    }

    /// Run the fold.
    ///
    /// Returns `Ok(None)` when `tables` is absent or has no table with this
    /// name; an existing but empty table yields an empty map. An empty name is
    /// an `InvalidArgument` error.
    pub fn build(self, tables: Option<&TableCollection>) -> Result<Option<KeyMap>, UncoverError> {
        let Some(tables) = tables else {
            return Ok(None);
        };
        if self.name.is_empty() {
            return Err(UncoverError::missing_name("to_map", "the table to index"));
        }
        let Some(records) = tables.get(&self.name) else {
            tracing::debug!(table = %self.name, "no such table to index");
            return Ok(None);
        };

        let mut combiner = match self.combiner {
            Some(combiner) => combiner,
            None => Box::new(key_by(self.key)) as Combiner<'a>,
        };

        let map = records
            .iter()
            .fold(self.initial.unwrap_or_default(), |mut map, record| {
                combiner(&mut map, record).unwrap_or(map)
            });

        Ok(Some(map))
    }
}

/// Index the table `name` by each record's `id`
pub fn to_map(tables: Option<&TableCollection>, name: &str) -> Result<Option<KeyMap>, UncoverError> {
    Index::new(name).build(tables)
}

/// Index the table `name` with a custom combiner, optionally folding into `initial`
pub fn to_map_with<F>(
    tables: Option<&TableCollection>,
    name: &str,
    combiner: F,
    initial: Option<KeyMap>,
) -> Result<Option<KeyMap>, UncoverError>
where
    F: FnMut(&mut KeyMap, &Record) -> Option<KeyMap>,
{
    let mut index = Index::new(name).combiner(combiner);
    if let Some(initial) = initial {
        index = index.initial(initial);
    }
    index.build(tables)
}

/// A combiner storing each record under the value of `attr`.
///
/// Records without the attribute are skipped.
pub fn key_by(attr: impl Into<String>) -> impl FnMut(&mut KeyMap, &Record) -> Option<KeyMap> {
    let attr = attr.into();
    move |map, record| {
        match record.get(&attr) {
            Some(key) => {
                map.insert(render_key(key), Value::Object(record.clone()));
            }
            None => tracing::trace!(key = %attr, "record has no key, skipping"),
        }
        None
    }
}

/// Map keys are strings: string values are used verbatim, whole-valued
/// numbers in integer form (`1` and `1.0` both become `"1"`), anything else
/// as compact JSON
pub fn render_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f == 0.0 => "0".to_string(),
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
