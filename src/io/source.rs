//! Resolve user-supplied input locations into local record files.
//!
//! Each input may be:
//! - a local file, used as is;
//! - a local directory, expanded to its direct children (files only, sorted);
//! - a glob pattern such as `data/*.tfrecords.gz`, expanded with [`expand_glob`];
//! - an object store URI (`s3://bucket/key`). A key naming an object is downloaded;
//!   an empty key, a key ending in `/`, or a key with objects below it is treated as
//!   a directory and its direct children are downloaded, as for local directories.
//!
//! Downloads land in a staging [`TempDir`] owned by the returned [`ResolvedSources`];
//! they are deleted when it is dropped. Input order is preserved.

use crate::error::{Error, IoContext, Result};
use crate::io::cloud::ObjectIO;
use crate::io::cloud::helpers::{RetryConfig, is_remote_uri, parse_object_uri, retry_with_backoff};
use crate::io::glob::expand_glob;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Local paths ready to be read, plus the staging folder backing any downloads.
#[derive(Debug)]
pub struct ResolvedSources {
    paths: Vec<PathBuf>,
    staging: Option<TempDir>,
}

impl ResolvedSources {
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn first(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Folder holding downloaded objects, if anything was downloaded.
    #[must_use]
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(TempDir::path)
    }
}

pub struct SourceResolver<'a> {
    store: Option<&'a dyn ObjectIO>,
    retry: RetryConfig,
}

impl<'a> SourceResolver<'a> {
    #[must_use]
    pub fn new(store: Option<&'a dyn ObjectIO>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Resolve every input, in order.
    ///
    /// # Errors
    /// `IoFailure` if a local path does not exist, a remote URI is given without an
    /// object store, or a download fails.
    pub fn resolve<S: AsRef<str>>(&self, inputs: &[S]) -> Result<ResolvedSources> {
        let mut resolved = ResolvedSources {
            paths: Vec::new(),
            staging: None,
        };
        for input in inputs {
            let input = input.as_ref();
            if is_remote_uri(input) {
                self.resolve_remote(input, &mut resolved)?;
            } else {
                resolved.paths.extend(resolve_local(input)?);
            }
        }
        info!(sources = resolved.paths.len(), "resolved input sources");
        Ok(resolved)
    }

    fn resolve_remote(&self, uri: &str, resolved: &mut ResolvedSources) -> Result<()> {
        let store = self
            .store
            .ok_or_else(|| Error::io(format!("no object store configured for {uri}")))?;
        let (bucket, key) = parse_object_uri(uri)?;

        let keys = if !key.is_empty()
            && !key.ends_with('/')
            && retry_with_backoff(&self.retry, || store.object_exists(&bucket, &key))?
        {
            vec![key]
        } else {
            let prefix = if key.is_empty() || key.ends_with('/') {
                key
            } else {
                format!("{key}/")
            };
            let listed = retry_with_backoff(&self.retry, || {
                store.list_objects(&bucket, Some(prefix.as_str()))
            })?;
            let children: Vec<String> = listed
                .into_iter()
                .map(|meta| meta.key)
                .filter(|key| is_direct_child(&prefix, key))
                .collect();
            if children.is_empty() {
                return Err(Error::io(format!("nothing found at {uri}")));
            }
            children
        };

        if resolved.staging.is_none() {
            resolved.staging = Some(
                tempfile::Builder::new()
                    .prefix("tfrecords-src-")
                    .tempdir()
                    .io_context(|| "create staging folder".to_string())?,
            );
        }
        let Some(staging) = resolved.staging.as_ref().map(|d| d.path().to_path_buf()) else {
            return Err(Error::io("staging folder missing"));
        };

        for key in keys {
            let data = retry_with_backoff(&self.retry, || store.get_object(&bucket, &key))?;
            let name = key.rsplit('/').next().unwrap_or(&key);
            let local = staging.join(format!("{:05}-{name}", resolved.paths.len()));
            fs::write(&local, &data).io_context(|| format!("stage {bucket}/{key}"))?;
            debug!(bucket = %bucket, key = %key, bytes = data.len(), "downloaded object");
            resolved.paths.push(local);
        }
        Ok(())
    }
}

/// `key` sits directly under `prefix`, not in a nested "folder".
fn is_direct_child(prefix: &str, key: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

fn expand_home(input: &str) -> PathBuf {
    match (input.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(input),
    }
}

fn resolve_local(input: &str) -> Result<Vec<PathBuf>> {
    let path = expand_home(input);
    if input.contains(['*', '?', '[']) && !path.exists() {
        return expand_glob(&path.to_string_lossy());
    }
    if path.is_dir() {
        let mut children = Vec::new();
        for entry in fs::read_dir(&path).io_context(|| format!("list {}", path.display()))? {
            let entry = entry.io_context(|| format!("list {}", path.display()))?;
            if entry.path().is_file() {
                children.push(entry.path());
            }
        }
        children.sort();
        return Ok(children);
    }
    if path.is_file() {
        return Ok(vec![path]);
    }
    Err(Error::io(format!("no such file or directory: {}", path.display())))
}
