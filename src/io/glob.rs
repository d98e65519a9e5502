//! Glob expansion for local input patterns.
//!
//! # Examples
//!
//! ```no_run
//! use tfrecords_table::io::glob::expand_glob;
//!
//! // All gzip-compressed shards of one run
//! let files = expand_glob("out/part-*-*.tfrecords.gz")?;
//! # Ok::<(), tfrecords_table::Error>(())
//! ```

use crate::error::{Error, IoContext, Result};
use glob::glob;
use std::path::PathBuf;

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Supports standard glob patterns:
/// - `*` matches any sequence of characters within a path component
/// - `?` matches any single character
/// - `**` matches zero or more directories
/// - `[abc]` matches any character in the set
///
/// Directories are skipped; results are sorted lexicographically so shards come
/// back in index order.
///
/// # Errors
///
/// Returns an `IoFailure` if:
/// - The pattern is invalid
/// - There are I/O errors accessing the filesystem
/// - No files match the pattern
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).io_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.io_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    if result.is_empty() {
        return Err(Error::io(format!("no files found matching pattern: {pattern}")));
    }

    result.sort();
    Ok(result)
}
