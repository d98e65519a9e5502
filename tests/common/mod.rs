#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tfrecords_table::{Table, Value};

/// Route library logs to the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// The two-row `id` / `tags` table used throughout the suite.
pub fn id_tags_table() -> Table {
    Table::from_rows(vec![
        vec![("id", Value::Int(1)), ("tags", Value::from(vec!["a", "b"]))],
        vec![("id", Value::Int(2)), ("tags", Value::from(vec!["c"]))],
    ])
}

/// Flat table with one column per feature type.
pub fn mixed_table(rows: i64) -> Table {
    Table::from_rows((0..rows).map(|i| {
        vec![
            ("id", Value::Int(i)),
            ("score", Value::Float(i as f64 + 0.5)),
            ("name", Value::Text(format!("row-{i}"))),
        ]
    }))
}

/// Record files in `dir`, sorted by name.
pub fn shard_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("dir entry").path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}
