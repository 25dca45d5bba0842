//! Normalization - flatten nested JSON into entity tables
//!
//! This module walks nested records depth-first and moves every nested
//! record (or array of records) into its own named table, leaving scalar
//! attributes on the owning record.
//!
//! ## Naming
//!
//! A nested record under `character` lands in the `characters` table; an
//! array of records under `animals` lands in `animals` as-is. Pluralization
//! goes through the [`inflect::Pluralize`] trait.

pub mod types;
pub mod extractor;
pub mod index;
pub mod inflect;
pub mod writer;

pub use types::{Attribute, Record, TableCollection, UncoverConfig};
pub use extractor::{uncover, Uncoverer};
pub use index::{key_by, render_key, to_map, to_map_with, Index, KeyMap};
pub use inflect::{English, Pluralize};
pub use writer::{SingleWriter, TableWriter};
