//! CSV bridge for [`Table`]s.
//!
//! The first row is the header. Cells are typed with the same ladder used when
//! casting decoded byte strings: integer, then float, then text. Empty cells are
//! `Null`.

use crate::codec::coerce;
use crate::error::Result;
use crate::io::compression::{detect_file_compression, open_reader};
use crate::table::Table;
use crate::value::Value;
use std::path::Path;

/// Read a headered CSV file into a table.
///
/// **Compression**: input compression is detected from the file's magic bytes.
///
/// # Errors
/// `IoFailure` if the file cannot be opened or a record cannot be parsed.
pub fn read_csv_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let kind = detect_file_compression(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(open_reader(path, kind)?);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut table = Table::new();
    for name in &headers {
        table.add_column(name.as_str());
    }
    for record in rdr.byte_records() {
        let record = record?;
        let row = headers.iter().zip(record.iter()).map(|(name, cell)| {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                coerce(cell).into()
            };
            (name.clone(), value)
        });
        table.push_row(row);
    }
    Ok(table)
}
