//! Durable writing of shards, one file per shard.
//!
//! Files are named `part-{index:05}-{run_id}.tfrecords{ext}` where `run_id` is a
//! fresh UUID shared by every shard of one write and `ext` depends on the codec.
//! Local destinations are created if missing. Object store destinations are staged
//! in a temporary folder first; each file is uploaded as soon as it is complete,
//! keeping the same name under the destination prefix.
//!
//! A failed run can leave some shards behind; the destination should be treated as
//! invalid and cleaned up before retrying.

use crate::error::{Error, IoContext, Result};
use crate::io::cloud::ObjectIO;
use crate::io::cloud::helpers::{RetryConfig, is_remote_uri, parse_object_uri, retry_with_backoff};
use crate::io::compression::{Compression, create_writer};
use crate::io::tfrecord::TfRecordWriter;
use crate::shard::Shard;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use uuid::Uuid;

/// Where shard files end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Local(PathBuf),
    Remote { bucket: String, prefix: String },
}

impl Destination {
    /// Classify `location` as a local folder or an object store prefix.
    ///
    /// # Errors
    /// `IoFailure` for a malformed object store URI.
    pub fn parse(location: &str) -> Result<Self> {
        if is_remote_uri(location) {
            let (bucket, key) = parse_object_uri(location)?;
            let prefix = key.trim_end_matches('/').to_string();
            return Ok(Self::Remote { bucket, prefix });
        }
        Ok(Self::Local(PathBuf::from(location)))
    }
}

/// File name for shard `index` of run `run_id`.
#[must_use]
pub fn shard_file_name(index: usize, run_id: &str, compression: Compression) -> String {
    format!(
        "part-{index:05}-{run_id}.tfrecords{}",
        compression.kind.extension()
    )
}

/// One shard file that has been written (and uploaded, for remote destinations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenShard {
    pub index: usize,
    pub file_name: String,
    /// Local path or `bucket/key`.
    pub location: String,
    pub records: usize,
    /// Serialized record bytes, before framing and compression.
    pub record_bytes: u64,
}

pub struct ShardWriter<'a> {
    destination: Destination,
    compression: Compression,
    run_id: String,
    folder: PathBuf,
    staging: Option<TempDir>,
    store: Option<&'a dyn ObjectIO>,
    retry: RetryConfig,
    written: Vec<WrittenShard>,
}

impl<'a> ShardWriter<'a> {
    /// Prepare a writer; creates the local folder or the staging folder.
    ///
    /// # Errors
    /// `IoFailure` if the folder cannot be created, or a remote destination is
    /// given without an object store.
    pub fn create(
        destination: Destination,
        compression: Compression,
        store: Option<&'a dyn ObjectIO>,
        retry: RetryConfig,
    ) -> Result<Self> {
        let (folder, staging) = match &destination {
            Destination::Local(folder) => {
                create_dir_all(folder).io_context(|| format!("mkdir -p {}", folder.display()))?;
                (folder.clone(), None)
            }
            Destination::Remote { bucket, .. } => {
                if store.is_none() {
                    return Err(Error::io(format!(
                        "no object store configured for bucket {bucket}"
                    )));
                }
                let staging = tempfile::Builder::new()
                    .prefix("tfrecords-out-")
                    .tempdir()
                    .io_context(|| "create staging folder".to_string())?;
                (staging.path().to_path_buf(), Some(staging))
            }
        };
        Ok(Self {
            destination,
            compression,
            run_id: Uuid::new_v4().to_string(),
            folder,
            staging,
            store,
            retry,
            written: Vec::new(),
        })
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Folder the files are written to locally (the staging folder for remote runs).
    #[must_use]
    pub fn local_folder(&self) -> &Path {
        &self.folder
    }

    /// Write the next shard. Empty shards still produce a (record-less) file.
    ///
    /// # Errors
    /// `IoFailure` if writing or uploading fails.
    pub fn write_shard(&mut self, shard: &Shard) -> Result<&WrittenShard> {
        let index = self.written.len();
        let file_name = shard_file_name(index, &self.run_id, self.compression);
        let path = self.folder.join(&file_name);

        let mut writer = TfRecordWriter::new(create_writer(&path, self.compression)?);
        for record in shard.records() {
            writer
                .write_record(record)
                .io_context(|| format!("write {}", path.display()))?;
        }
        writer
            .into_inner()
            .finish()
            .io_context(|| format!("finish {}", path.display()))?;

        let location = match &self.destination {
            Destination::Local(_) => path.display().to_string(),
            Destination::Remote { bucket, prefix } => self.upload(bucket, prefix, &file_name, &path)?,
        };
        debug!(index, records = shard.len(), bytes = shard.byte_size(), %location, "wrote shard");

        self.written.push(WrittenShard {
            index,
            file_name,
            location,
            records: shard.len(),
            record_bytes: shard.byte_size(),
        });
        self.written
            .last()
            .ok_or_else(|| Error::io("shard bookkeeping lost"))
    }

    fn upload(&self, bucket: &str, prefix: &str, file_name: &str, path: &Path) -> Result<String> {
        let store = self
            .store
            .ok_or_else(|| Error::io(format!("no object store configured for bucket {bucket}")))?;
        let key = if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{prefix}/{file_name}")
        };
        let data = fs::read(path).io_context(|| format!("read {}", path.display()))?;
        retry_with_backoff(&self.retry, || store.put_object(bucket, &key, &data))?;
        Ok(format!("{bucket}/{key}"))
    }

    /// Finish the run and report what was written. Drops the staging folder.
    #[must_use]
    pub fn finish(self) -> Vec<WrittenShard> {
        info!(
            run_id = %self.run_id,
            shards = self.written.len(),
            staged = self.staging.is_some(),
            "finished writing shards"
        );
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::compression::CompressionType;

    #[test]
    fn test_shard_file_name() {
        assert_eq!(
            shard_file_name(3, "run", Compression::gzip(9)),
            "part-00003-run.tfrecords.gz"
        );
        assert_eq!(
            shard_file_name(12, "run", Compression::none()),
            "part-00012-run.tfrecords"
        );
        assert_eq!(
            shard_file_name(0, "run", Compression::new(CompressionType::Zlib, 5)),
            "part-00000-run.tfrecords.zlib"
        );
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!(
            Destination::parse("s3://bucket/out/").unwrap(),
            Destination::Remote {
                bucket: "bucket".into(),
                prefix: "out".into()
            }
        );
        assert_eq!(
            Destination::parse("/tmp/out").unwrap(),
            Destination::Local(PathBuf::from("/tmp/out"))
        );
    }
}
