//! Object storage trait for remote sources and shard destinations.
//!
//! The trait is synchronous; implementations backed by async SDKs block internally.

use std::error::Error;
use std::fmt;

/// Failure reported by an [`ObjectIO`] implementation.
#[derive(Debug, Clone)]
pub struct CloudIOError {
    pub message: String,
    pub kind: ErrorKind,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    PermissionDenied,
    Network,
    Timeout,
    ServiceUnavailable,
    RateLimited,
    Other,
}

impl fmt::Display for CloudIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{:?}: {} ({source})", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for CloudIOError {}

impl CloudIOError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Network hiccups, timeouts, throttling and unavailable services.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Network
                | ErrorKind::Timeout
                | ErrorKind::ServiceUnavailable
                | ErrorKind::RateLimited
        )
    }
}

pub type CloudResult<T> = Result<T, CloudIOError>;

/// One listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: u64,
}

/// Minimal blob store contract used to stage record files in and out.
///
/// Keys are plain strings; `/` carries no meaning except in prefix listings.
pub trait ObjectIO: Send + Sync {
    /// Store `data` under `bucket/key`, replacing any existing object.
    ///
    /// # Errors
    /// Any provider failure; transient kinds are retried by the caller.
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> CloudResult<()>;

    /// Fetch the whole object.
    ///
    /// # Errors
    /// `NotFound` for a missing object, otherwise any provider failure.
    fn get_object(&self, bucket: &str, key: &str) -> CloudResult<Vec<u8>>;

    /// Objects whose key starts with `prefix` (all objects for `None`), sorted by key.
    ///
    /// # Errors
    /// Any provider failure.
    fn list_objects(&self, bucket: &str, prefix: Option<&str>) -> CloudResult<Vec<ObjectMetadata>>;

    /// # Errors
    /// Any provider failure other than the object being absent.
    fn object_exists(&self, bucket: &str, key: &str) -> CloudResult<bool>;
}
