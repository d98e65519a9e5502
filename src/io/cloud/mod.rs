//! Object storage seam for remote sources and destinations.
//!
//! Remote locations (`s3://bucket/key`, `gs://bucket/key`) are served through the
//! [`ObjectIO`] trait. It is synchronous and provider agnostic: a real deployment
//! plugs in an SDK-backed implementation, tests use the in-memory [`FakeObjectIO`].
//!
//! ## Usage
//! ```
//! use tfrecords_table::io::cloud::*;
//!
//! # fn main() -> CloudResult<()> {
//! let storage = FakeObjectIO::new();
//! storage.put_object("bucket", "data/part-00000.tfrecords", b"...")?;
//! assert!(storage.object_exists("bucket", "data/part-00000.tfrecords")?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Operations return [`CloudResult<T>`]. Transient kinds (`Network`, `Timeout`,
//! `ServiceUnavailable`, `RateLimited`) are retried by [`helpers::retry_with_backoff`];
//! everything else surfaces immediately as an `IoFailure`.

pub mod fake;
pub mod helpers;
pub mod traits;

pub use fake::*;
pub use traits::*;
