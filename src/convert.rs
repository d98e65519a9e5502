//! Top-level entry points: table to sharded record files, and record files to table.
//!
//! ```no_run
//! use tfrecords_table::{Compression, DecodeOptions, EncodeOptions, Table, Value, decode, encode};
//!
//! # fn main() -> tfrecords_table::Result<()> {
//! let table = Table::from_rows(vec![
//!     vec![("id", Value::Int(1)), ("tags", Value::from(vec!["a", "b"]))],
//!     vec![("id", Value::Int(2)), ("tags", Value::from(vec!["c"]))],
//! ]);
//!
//! let summary = encode(
//!     &table,
//!     "out/",
//!     &EncodeOptions::default().with_compression(Compression::gzip(6)),
//! )?;
//! println!("wrote {} shards", summary.shards.len());
//!
//! let back = decode(&["out/"], &DecodeOptions::default())?;
//! assert_eq!(back.num_rows(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! Each call is independent: the schema is derived once per call and nothing is
//! shared between calls, so separate calls may run on separate threads.

use crate::codec::{RecordStream, RowEncoder, decode_record};
use crate::error::{IoContext, Result};
use crate::io::cloud::ObjectIO;
use crate::io::cloud::helpers::RetryConfig;
use crate::io::compression::{Compression, CompressionType, create_writer, detect_file_compression};
use crate::io::sink::{Destination, ShardWriter, WrittenShard};
use crate::io::source::SourceResolver;
use crate::io::tfrecord::{TfRecordWriter, read_record_files};
use crate::record::Record;
use crate::schema::{InferredSchema, Schema, infer_decode_schema, infer_encode_schema};
use crate::shard::{DEFAULT_MAX_SHARD_BYTES, split_by_size};
use crate::table::Table;
use std::fs::create_dir_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings for [`Converter::encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub compression: Compression,
    /// Only encode these columns; others are skipped.
    pub columns: Option<Vec<String>>,
    /// Per-shard budget in serialized record bytes; `None` writes a single shard.
    pub max_shard_bytes: Option<u64>,
    /// Use this schema instead of inferring one from the first row.
    pub schema: Option<Schema>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            columns: None,
            max_shard_bytes: Some(DEFAULT_MAX_SHARD_BYTES),
            schema: None,
        }
    }
}

impl EncodeOptions {
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn with_max_shard_bytes(mut self, max_shard_bytes: Option<u64>) -> Self {
        self.max_shard_bytes = max_shard_bytes;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// How to pick the codec for reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionChoice {
    /// Detect from the first source's magic bytes.
    #[default]
    Auto,
    Fixed(CompressionType),
}

/// Settings for [`Converter::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Use this schema instead of inferring one from the first record.
    pub schema: Option<Schema>,
    pub compression: CompressionChoice,
    /// Run byte strings through the int/float/text cast ladder.
    pub cast: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            schema: None,
            compression: CompressionChoice::Auto,
            cast: true,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub const fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = CompressionChoice::Fixed(compression);
        self
    }

    #[must_use]
    pub const fn with_cast(mut self, cast: bool) -> Self {
        self.cast = cast;
        self
    }
}

/// What an encode run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSummary {
    pub run_id: String,
    pub schema: Schema,
    pub shards: Vec<WrittenShard>,
}

impl EncodeSummary {
    #[must_use]
    pub fn records(&self) -> usize {
        self.shards.iter().map(|s| s.records).sum()
    }
}

/// Conversion entry point, optionally wired to an object store for remote paths.
#[derive(Clone, Default)]
pub struct Converter {
    store: Option<Arc<dyn ObjectIO>>,
    retry: RetryConfig,
}

impl Converter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_object_store(mut self, store: Arc<dyn ObjectIO>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn encoder_for(table: &Table, options: &EncodeOptions) -> Result<RowEncoder> {
        let schema = match (&options.schema, table.row(0)) {
            (Some(schema), _) => schema.clone(),
            (None, Some(sample)) => infer_encode_schema(&sample, options.columns.as_deref())?,
            (None, None) => Schema::new(),
        };
        info!(columns = schema.len(), rows = table.num_rows(), "encode schema ready");

        let filtered_out: Vec<String> = match &options.columns {
            Some(allow) => table
                .column_names()
                .filter(|name| !allow.iter().any(|c| c == name))
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        Ok(RowEncoder::new(schema).ignoring(filtered_out))
    }

    /// Encode `table` into shard files under `destination` (a folder or an
    /// object store prefix).
    ///
    /// # Errors
    /// - `UnsupportedType` if a column cannot be typed or a value cannot be coerced
    /// - `SchemaMismatch` if a row has a column missing from a supplied schema
    /// - `IoFailure` if writing or uploading fails; already written shards are left behind
    pub fn encode(
        &self,
        table: &Table,
        destination: &str,
        options: &EncodeOptions,
    ) -> Result<EncodeSummary> {
        let encoder = Self::encoder_for(table, options)?;
        let mut writer = ShardWriter::create(
            Destination::parse(destination)?,
            options.compression,
            self.store.as_deref(),
            self.retry,
        )?;

        let records = RecordStream::new(table.rows(), &encoder).serialized();
        for shard in split_by_size(records, options.max_shard_bytes) {
            writer.write_shard(&shard?)?;
        }

        let run_id = writer.run_id().to_string();
        let shards = writer.finish();
        Ok(EncodeSummary {
            run_id,
            schema: encoder.schema().clone(),
            shards,
        })
    }

    /// Encode every row of `table` into a single local file, without sharding.
    ///
    /// # Returns
    /// The number of records written.
    ///
    /// # Errors
    /// Same as [`Converter::encode`].
    pub fn encode_to_file(
        &self,
        table: &Table,
        path: impl AsRef<Path>,
        options: &EncodeOptions,
    ) -> Result<usize> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).io_context(|| format!("mkdir -p {}", parent.display()))?;
        }
        let encoder = Self::encoder_for(table, options)?;
        let mut writer = TfRecordWriter::new(create_writer(path, options.compression)?);
        for record in RecordStream::new(table.rows(), &encoder).serialized() {
            writer
                .write_record(&record?)
                .io_context(|| format!("write {}", path.display()))?;
        }
        let written = writer.records_written();
        writer
            .into_inner()
            .finish()
            .io_context(|| format!("finish {}", path.display()))?;
        debug!(path = %path.display(), records = written, "wrote single record file");
        Ok(written)
    }

    /// Decode every record from `sources` into one table.
    ///
    /// Sources may be files, folders, glob patterns or object store URIs. Without a
    /// schema override, the schema is inferred from the first record. Columns are
    /// ordered by name.
    ///
    /// # Errors
    /// - `MalformedRecord` if a source holds bytes that are not valid records
    /// - `SchemaMismatch` if a field's type disagrees with the schema
    /// - `IoFailure` if a source cannot be resolved or read
    pub fn decode<S: AsRef<str>>(&self, sources: &[S], options: &DecodeOptions) -> Result<Table> {
        let resolved = SourceResolver::new(self.store.as_deref(), self.retry).resolve(sources)?;
        let Some(first_path) = resolved.first() else {
            return Ok(Table::new());
        };
        let kind = match options.compression {
            CompressionChoice::Auto => detect_file_compression(first_path)?,
            CompressionChoice::Fixed(kind) => kind,
        };
        debug!(compression = kind.name(), "reading record files");

        let mut records = read_record_files(resolved.paths(), kind);
        let first = records.next().transpose()?;

        let mut inferred = match (&options.schema, &first) {
            (Some(schema), _) => InferredSchema {
                schema: schema.clone(),
                ..InferredSchema::default()
            },
            (None, Some(bytes)) => infer_decode_schema(&Record::from_bytes(bytes)?),
            (None, None) => InferredSchema::default(),
        };
        if inferred.schema.is_empty() {
            return Ok(Table::new());
        }

        let mut table = Table::new();
        for name in inferred.schema.column_names() {
            table.add_column(name);
        }
        for bytes in first.into_iter().map(Ok).chain(records) {
            let record = Record::from_bytes(&bytes?)?;
            inferred.settle(&record);
            table.push_row(decode_record(record, &inferred.schema, options.cast)?);
        }
        if !inferred.untyped.is_empty() {
            debug!(columns = ?inferred.untyped, "list columns held no values; read as bytes");
        }
        info!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            sources = resolved.len(),
            "decoded table"
        );
        Ok(table)
    }
}

/// [`Converter::encode`] with local destinations only.
///
/// # Errors
/// See [`Converter::encode`].
pub fn encode(table: &Table, destination: &str, options: &EncodeOptions) -> Result<EncodeSummary> {
    Converter::new().encode(table, destination, options)
}

/// [`Converter::decode`] with local sources only.
///
/// # Errors
/// See [`Converter::decode`].
pub fn decode<S: AsRef<str>>(sources: &[S], options: &DecodeOptions) -> Result<Table> {
    Converter::new().decode(sources, options)
}
