//! Retry and URI helpers for the object storage adapter.
//!
//! - [`retry_with_backoff`] - Retry transient failures with exponential backoff
//! - [`parse_object_uri`] - Split `s3://bucket/key` style URIs
//! - [`is_remote_uri`] - Tell object store URIs from local paths

use crate::io::cloud::traits::{CloudIOError, CloudResult, ErrorKind};
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }
}

/// Retry a function with exponential backoff
///
/// Only transient errors (see [`CloudIOError::is_transient`]) are retried.
///
/// # Errors
///
/// Returns the last error once it is not transient or `max_attempts` is reached.
pub fn retry_with_backoff<F, T>(config: &RetryConfig, mut operation: F) -> CloudResult<T>
where
    F: FnMut() -> CloudResult<T>,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        attempt += 1;
        match operation() {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_transient() || attempt >= config.max_attempts {
                    return Err(err);
                }
                tracing::warn!(attempt, delay_ms, error = %err, "retrying object store call");
                std::thread::sleep(Duration::from_millis(delay_ms));

                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let next = (delay_ms as f64 * config.backoff_multiplier) as u64;
                delay_ms = next.min(config.max_delay_ms);
            }
        }
    }
}

/// Object store schemes understood as remote locations.
const REMOTE_SCHEMES: [&str; 4] = ["s3", "s3a", "gs", "gcs"];

/// True for `s3://…`, `gs://…` and friends.
#[must_use]
pub fn is_remote_uri(uri: &str) -> bool {
    uri.split_once("://")
        .is_some_and(|(scheme, _)| REMOTE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()))
}

/// Split `scheme://bucket/key/parts` into `(bucket, key)`.
///
/// The key may be empty (`s3://bucket` or `s3://bucket/`).
///
/// # Errors
///
/// Returns an error if the URI has no `://` separator or no bucket
pub fn parse_object_uri(uri: &str) -> CloudResult<(String, String)> {
    let Some((_, rest)) = uri.split_once("://") else {
        return Err(CloudIOError::new(
            ErrorKind::InvalidInput,
            format!("Invalid resource URI format: {uri}"),
        ));
    };
    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(CloudIOError::new(
            ErrorKind::InvalidInput,
            format!("Missing bucket in URI: {uri}"),
        ));
    }
    Ok((bucket.to_string(), key.to_string()))
}
