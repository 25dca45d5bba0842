use crate::normalize::types::TableCollection;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes tables to multiple JSON Lines files, one per table
pub struct TableWriter<W: Write> {
    output_dir: PathBuf,
    writers: HashMap<String, W>,
}

impl TableWriter<BufWriter<File>> {
    /// Create a new TableWriter that writes `<table>.jsonl` files into a directory
    pub fn new_file_writer<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        std::fs::create_dir_all(&output_dir)
            .context("Failed to create output directory")?;

        Ok(TableWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
            writers: HashMap::new(),
        })
    }

    /// Append every record to its table's file.
    ///
    /// Empty tables still get an (empty) file.
    pub fn write_tables(&mut self, tables: &TableCollection) -> Result<()> {
        for (name, records) in tables.iter() {
            if !self.writers.contains_key(name) {
                let path = self.output_dir.join(format!("{}.jsonl", name));
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open file: {}", path.display()))?;
                tracing::debug!(table = name, path = %path.display(), "opened table file");
                self.writers.insert(name.to_string(), BufWriter::new(file));
            }

            let Some(writer) = self.writers.get_mut(name) else {
                continue;
            };
            for record in records {
                let json = serde_json::to_string(record)
                    .context("Failed to serialize record")?;
                writeln!(writer, "{}", json)
                    .context("Failed to write record")?;
            }
        }
        Ok(())
    }

    /// Flush all writers
    pub fn flush(&mut self) -> Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush().context("Failed to flush writer")?;
        }
        Ok(())
    }
}

/// A simpler writer that writes all tables to a single output,
/// tagging each record with its `_table`
pub struct SingleWriter<W: Write> {
    writer: W,
}

impl<W: Write> SingleWriter<W> {
    pub fn new(writer: W) -> Self {
        SingleWriter { writer }
    }

    pub fn write_tables(&mut self, tables: &TableCollection) -> Result<()> {
        for (name, records) in tables.iter() {
            for record in records {
                let mut data = record.clone();
                data.insert("_table".to_string(), Value::String(name.to_string()));

                let json = serde_json::to_string(&data)
                    .context("Failed to serialize record")?;
                writeln!(self.writer, "{}", json)
                    .context("Failed to write record")?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TableCollection {
        serde_json::from_value(json!({
            "books": [{"name": "Jungle Book"}],
            "characters": [{"name": "Baloo"}, {"name": "Akela"}],
            "tags": []
        }))
        .unwrap()
    }

    #[test]
    fn test_single_writer() {
        let mut buffer = Vec::new();
        let mut writer = SingleWriter::new(&mut buffer);

        writer.write_tables(&sample()).unwrap();
        writer.flush().unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], json!({"name": "Jungle Book", "_table": "books"}));
        assert_eq!(lines[2]["_table"], "characters");
    }

    #[test]
    fn test_file_writer() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TableWriter::new_file_writer(dir.path()).unwrap();

        writer.write_tables(&sample()).unwrap();
        writer.write_tables(&sample()).unwrap();
        writer.flush().unwrap();

        let characters = std::fs::read_to_string(dir.path().join("characters.jsonl")).unwrap();
        assert_eq!(characters.lines().count(), 4);
        assert!(characters.starts_with(r#"{"name":"Baloo"}"#));

        let tags = std::fs::read_to_string(dir.path().join("tags.jsonl")).unwrap();
        assert!(tags.is_empty());
    }
}
