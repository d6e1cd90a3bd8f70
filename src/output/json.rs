//! Products document persistence
//!
//! The document is pretty-printed with four-space indentation and raw UTF-8,
//! so Cyrillic keys and values stay readable in the file.

use crate::output::{OutputError, OutputResult};
use crate::store::AggregationStore;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Serializes a store as the products document
///
/// Records inside each category are written in sorted order, so sweeps over
/// an unchanged site produce identical files.
pub fn to_products_json(store: &AggregationStore) -> OutputResult<String> {
    let mut buffer = Vec::new();
    write_pretty(&store.canonical(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| OutputError::Format(e.to_string()))
}

/// Writes the products document to a file
///
/// # Arguments
///
/// * `store` - The aggregated records
/// * `path` - Destination file, created or truncated
pub fn write_products(store: &AggregationStore, path: &Path) -> OutputResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_pretty(&store.canonical(), &mut writer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads a products document back into a store
pub fn read_products(path: &Path) -> OutputResult<AggregationStore> {
    let file = File::open(path)?;
    let store = serde_json::from_reader(BufReader::new(file))?;
    Ok(store)
}

fn write_pretty<W: Write, T: Serialize>(value: &T, writer: W) -> OutputResult<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}
