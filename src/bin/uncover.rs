//! uncover: Flatten nested JSON into entity tables
//!
//! Usage:
//!   # Read from file, print the tables as one JSON object
//!   uncover --name book book.json
//!
//!   # Read from stdin
//!   echo '{"name": "Jungle Book", "character": {"name": "Baloo"}}' | uncover -n book
//!
//!   # Process NDJSON, write one .jsonl file per table
//!   uncover -n event --ndjson events.jsonl --output-dir ./tables
//!
//!   # Print one table as a { id -> record } map
//!   uncover -n book book.json --index characters --key name

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use tracing_subscriber::EnvFilter;
use uncover::{Index, SingleWriter, TableCollection, TableWriter, UncoverConfig, Uncoverer};

#[derive(Parser, Debug)]
#[command(name = "uncover")]
#[command(about = "Flatten nested JSON into entity tables", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Name of the root entity, e.g. "book". Pluralized for a single root object
    #[arg(long, short = 'n')]
    name: String,

    /// Process newline-delimited JSON (one JSON value per line)
    #[arg(long)]
    ndjson: bool,

    /// Output directory for separate .jsonl files per table
    #[arg(long, short = 'o', conflicts_with = "index")]
    output_dir: Option<String>,

    /// Write all records to stdout as JSON Lines tagged with "_table"
    #[arg(long, conflicts_with_all = ["output_dir", "index"])]
    jsonl: bool,

    /// Print this table as a { key -> record } map instead of all tables
    #[arg(long, value_name = "TABLE")]
    index: Option<String>,

    /// Attribute to key the index by (default: "id")
    #[arg(long, requires = "index")]
    key: Option<String>,

    /// JSON config file (scalar_fields, max_depth). Flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Comma-separated attributes to never extract into tables
    #[arg(long)]
    scalar_fields: Option<String>,

    /// Maximum nesting depth to extract
    #[arg(long)]
    max_depth: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Build config
    let mut config = match &args.config {
        Some(path) => UncoverConfig::from_file(path)?,
        None => UncoverConfig::default(),
    };
    if let Some(depth) = args.max_depth {
        config.max_depth = Some(depth);
    }
    if let Some(fields_str) = &args.scalar_fields {
        config.scalar_fields = fields_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    tracing::debug!(?config, "resolved config");

    let content = read_input(args.input.as_deref())?;
    let tables = uncover_content(content, &args.name, args.ndjson, config)?;
    tracing::info!(
        tables = tables.len(),
        records = tables.record_count(),
        "uncovered input"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Some(output_dir) = &args.output_dir {
        let mut writer = TableWriter::new_file_writer(output_dir)?;
        writer.write_tables(&tables)?;
        writer.flush()?;
        tracing::info!(dir = %output_dir, "wrote table files");
    } else if args.jsonl {
        let mut writer = SingleWriter::new(&mut out);
        writer.write_tables(&tables)?;
        writer.flush()?;
    } else if let Some(table) = &args.index {
        let mut index = Index::new(table.as_str());
        if let Some(key) = &args.key {
            index = index.key(key.as_str());
        }
        let map = index.build(Some(&tables))?;
        if map.is_none() {
            tracing::warn!(table = %table, "no such table");
        }
        write_json(&mut out, &map, args.pretty)?;
    } else {
        write_json(&mut out, &tables, args.pretty)?;
    }

    Ok(())
}

/// Install a stderr subscriber; RUST_LOG overrides the -v level
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(input_file: Option<&str>) -> Result<Vec<u8>> {
    let reader = if let Some(file_path) = input_file {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open input: {}", file_path))?;
        Box::new(BufReader::new(file)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let mut content = Vec::new();
    BufReader::new(reader)
        .read_to_end(&mut content)
        .context("Failed to read input")?;
    Ok(content)
}

/// Parse the input (one document, or one per line with `ndjson`) and uncover it
fn uncover_content(
    content: Vec<u8>,
    name: &str,
    ndjson: bool,
    config: UncoverConfig,
) -> Result<TableCollection> {
    if ndjson {
        return uncover::uncover_json(content.as_slice(), name, config);
    }

    let value = uncover::parse_document(content)?;

    Ok(Uncoverer::new(config).uncover(value, name)?)
}

fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{}", json).context("Failed to write output")?;
    Ok(())
}
