//! JSON Lines bridge for [`Table`]s.
//!
//! One JSON object per line, one key per column. Columns appear in first-seen key
//! order and keys missing from a line read as `Null`. Blank lines are skipped.
//!
//! **Compression**: input compression is detected from the file's magic bytes.

use crate::error::{Error, IoContext, Result};
use crate::io::compression::{Compression, create_writer, detect_file_compression, open_reader};
use crate::table::Table;
use crate::value::Value;
use serde_json::Value as Json;
use std::fs::create_dir_all;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Read a JSONL file into a table.
///
/// # Errors
/// `IoFailure` if the file cannot be read or a line is not a JSON object;
/// `UnsupportedType` if a cell holds a nested object.
pub fn read_jsonl_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let kind = detect_file_compression(path)?;
    let rdr = BufReader::new(open_reader(path, kind)?);
    let mut table = Table::new();
    for (i, line) in rdr.lines().enumerate() {
        let line = line.io_context(|| format!("read line {} in {}", i + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let Json::Object(object) = serde_json::from_str(&line)
            .io_context(|| format!("parse JSONL line {} in {}", i + 1, path.display()))?
        else {
            return Err(Error::io(format!(
                "line {} in {} is not a JSON object",
                i + 1,
                path.display()
            )));
        };
        let row = object
            .iter()
            .map(|(name, json)| Ok((name.clone(), Value::from_json(name, json)?)))
            .collect::<Result<Vec<_>>>()?;
        table.push_row(row);
    }
    Ok(table)
}

/// Write a table as JSONL, one object per row. Parent directories are created as needed.
///
/// # Returns
/// The number of rows written.
///
/// # Errors
/// `IoFailure` if the file or its directories cannot be created or written.
pub fn write_jsonl_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).io_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let mut w = create_writer(path, Compression::none())?;
    for (i, row) in table.rows().enumerate() {
        let object: serde_json::Map<String, Json> = row
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();
        serde_json::to_writer(&mut w, &object)
            .io_context(|| format!("serialize row #{i} to {}", path.display()))?;
        w.write_all(b"\n")?;
    }
    w.finish()
        .io_context(|| format!("flush {}", path.display()))?;
    Ok(table.num_rows())
}
