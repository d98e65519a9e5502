//! Error type shared by every conversion operation.
//!
//! All failures surface as a single [`Error`] carrying an [`ErrorKind`]:
//! - `UnsupportedType` - a value cannot be mapped to (or coerced into) a feature type
//! - `SchemaMismatch` - a row or record disagrees with the active schema
//! - `MalformedRecord` - bytes that do not parse as a framed record
//! - `IoFailure` - local or remote storage failed
//!
//! Nothing is retried at this level; remote retries live in the storage adapter.

use crate::io::cloud::CloudIOError;
use std::fmt;
use std::sync::Arc;

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    /// Short context such as the file a record came from.
    pub source: Option<String>,
    cause: Option<Cause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedType,
    SchemaMismatch,
    MalformedRecord,
    IoFailure,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{:?}: {} ({source})", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Keep `cause` as the underlying error; its text also becomes the context.
    #[must_use]
    pub fn caused_by<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        if self.source.is_none() {
            self.source = Some(cause.to_string());
        }
        self.cause = Some(Arc::new(cause));
        self
    }

    /// A column's value has a native type no feature type covers.
    pub fn unsupported_type(column: &str, type_name: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedType,
            format!("unsupported type {type_name} in column '{column}'"),
        )
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaMismatch, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedRecord, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoFailure, message)
    }

    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let mut error = Self::io(err.to_string());
        error.cause = Some(Arc::new(err));
        error
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Self::malformed("record does not parse as a SequenceExample").caused_by(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::io("json (de)serialization failed").caused_by(err)
    }
}

impl From<CloudIOError> for Error {
    fn from(err: CloudIOError) -> Self {
        Self::io(err.message.clone())
            .with_source(format!("{:?}", err.kind))
            .caused_by(err)
    }
}

#[cfg(feature = "io-csv")]
impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::io("csv read failed").caused_by(err)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Attach a human-readable location to a failing storage call.
pub(crate) trait IoContext<T> {
    fn io_context<F: FnOnce() -> String>(self, what: F) -> Result<T>;
}

impl<T, E> IoContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn io_context<F: FnOnce() -> String>(self, what: F) -> Result<T> {
        self.map_err(|e| Error::io(what()).caused_by(e))
    }
}
