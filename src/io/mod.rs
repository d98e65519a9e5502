//! Storage side of the conversion: record framing, compression, local and
//! object store sources and sinks, plus optional table bridges.

pub mod cloud;
pub mod compression;
pub mod glob;
pub mod sink;
pub mod source;
pub mod tfrecord;

#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub mod jsonl;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;
