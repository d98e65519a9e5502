//! # tfrecords-table
//!
//! Convert **in-memory tables** to sharded TFRecord files of `Example` /
//! `SequenceExample` protobuf records, and read such files back into a table.
//!
//! ## Key Features
//!
//! - **Schema inference** - column types come from the first row on write and the first record on read
//! - **Scalar and list columns** - scalars go to an `Example`, lists to a `SequenceExample`
//! - **Missing values** - `Null` and `NaN` numbers encode as the sentinel `-999`
//! - **Cast ladder** - byte strings decode as integer, float, text or raw bytes, in that order
//! - **Size-bounded shards** - records are packed greedily under a byte budget
//! - **Compression** - gzip or zlib on write, detected from magic bytes on read
//! - **Remote storage** - `s3://` and `gs://` locations through the [`ObjectIO`](io::cloud::ObjectIO) seam
//!
//! ## Quick Start
//!
//! ```no_run
//! use tfrecords_table::*;
//!
//! # fn main() -> Result<()> {
//! let table = Table::from_rows(vec![
//!     vec![("id", Value::Int(1)), ("tags", Value::from(vec!["a", "b"]))],
//!     vec![("id", Value::Int(2)), ("tags", Value::from(vec!["c"]))],
//! ]);
//!
//! let summary = encode(&table, "out/", &EncodeOptions::default())?;
//! assert_eq!(summary.records(), 2);
//!
//! let back = decode(&["out/"], &DecodeOptions::default())?;
//! assert_eq!(back.num_rows(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Table
//!
//! A [`Table`] holds named columns of [`Value`]s, all of the same length. Rows are
//! views over one index across every column.
//!
//! ### Schema
//!
//! A [`Schema`] maps each column to a [`FeatureType`] (`Int64`, `Float32` or `Bytes`)
//! and a [`Cardinality`] (`Scalar` or `List`). Supply one through
//! [`EncodeOptions::with_schema`] or [`DecodeOptions::with_schema`] to skip inference.
//!
//! ### Records and Shards
//!
//! Each row becomes one [`Record`]. Serialized records are grouped into shards by
//! [`split_by_size`]; each shard is written as one file named
//! `part-{index:05}-{run_id}.tfrecords{ext}`. The final shard is always written,
//! even when it is empty.
//!
//! ## Errors
//!
//! Every operation returns [`Result`], whose [`Error`] carries an [`ErrorKind`]:
//! `UnsupportedType`, `SchemaMismatch`, `MalformedRecord` or `IoFailure`.
//!
//! ## Feature Flags
//!
//! - `io-jsonl` (default) - JSON Lines table bridge
//! - `io-csv` (default) - CSV table reader
//! - `compression-gzip` (default) - zlib and gzip codecs

pub mod codec;
pub mod convert;
pub mod error;
pub mod feature;
pub mod io;
pub mod proto;
pub mod record;
pub mod schema;
pub mod shard;
pub mod table;
pub mod value;

// General re-exports
pub use codec::{Coerced, RecordStream, RowEncoder, coerce, decode_record};
pub use convert::{
    CompressionChoice, Converter, DecodeOptions, EncodeOptions, EncodeSummary, decode, encode,
};
pub use error::{Error, ErrorKind, Result};
pub use feature::SENTINEL;
pub use io::cloud::helpers::RetryConfig;
pub use io::compression::{Compression, CompressionType, detect_compression};
pub use io::sink::WrittenShard;
pub use record::{Record, RecordShape, TypedField};
pub use schema::{
    Cardinality, ColumnSpec, FeatureType, InferredSchema, Schema, infer_decode_schema,
    infer_encode_schema,
};
pub use shard::{DEFAULT_MAX_SHARD_BYTES, Shard, mib, split_by_size};
pub use table::{Column, Row, Table};
pub use value::Value;

// Gated re-exports
#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{read_jsonl_table, write_jsonl_table};

#[cfg(feature = "io-csv")]
pub use io::csv::read_csv_table;
