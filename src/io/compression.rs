//! Whole-file compression for record files.
//!
//! Record files are compressed as a single stream, the same way TensorFlow's
//! record writer does it:
//! - **Zlib** (`.zlib`) - via `flate2` (feature: `compression-gzip`)
//! - **Gzip** (`.gz`) - via `flate2` (feature: `compression-gzip`)
//!
//! ## Detection
//!
//! Readers detect the codec from the first two bytes of the file:
//!
//! | Prefix        | Codec |
//! |---------------|-------|
//! | `78 01`       | zlib  |
//! | `78 5E`       | zlib  |
//! | `78 9C`       | zlib  |
//! | `78 DA`       | zlib  |
//! | `1F 8B`       | gzip  |
//!
//! Anything else is read as uncompressed. Detection only needs the magic table, so
//! it works even when the codecs themselves are compiled out.
//!
//! ## Custom Codecs
//!
//! Each algorithm is a [`CompressionCodec`]; the built-in ones are looked up with
//! [`codec_for`].

use crate::error::{Error, IoContext, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionType {
    #[default]
    None,
    Zlib,
    Gzip,
}

const MAGIC_TABLE: [(&[u8; 2], CompressionType); 5] = [
    (&[0x78, 0x01], CompressionType::Zlib),
    (&[0x78, 0x5e], CompressionType::Zlib),
    (&[0x78, 0x9c], CompressionType::Zlib),
    (&[0x78, 0xda], CompressionType::Zlib),
    (&[0x1f, 0x8b], CompressionType::Gzip),
];

impl CompressionType {
    /// File name suffix for files written with this codec.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Zlib => ".zlib",
            Self::Gzip => ".gz",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Gzip => "gzip",
        }
    }
}

impl FromStr for CompressionType {
    type Err = Error;

    /// Accepts `GZIP`, `ZLIB`, `NONE` or the empty string, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "zlib" => Ok(Self::Zlib),
            "gzip" | "gz" => Ok(Self::Gzip),
            other => Err(Error::io(format!("unknown compression type '{other}'"))),
        }
    }
}

/// Compression settings for one write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compression {
    pub kind: CompressionType,
    pub level: u32,
}

impl Default for Compression {
    fn default() -> Self {
        Self::gzip(9)
    }
}

impl Compression {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: CompressionType::None,
            level: 0,
        }
    }

    #[must_use]
    pub fn zlib(level: u32) -> Self {
        Self::new(CompressionType::Zlib, level)
    }

    #[must_use]
    pub fn gzip(level: u32) -> Self {
        Self::new(CompressionType::Gzip, level)
    }

    /// Levels above 9 are clamped to 9.
    #[must_use]
    pub fn new(kind: CompressionType, level: u32) -> Self {
        Self {
            kind,
            level: level.min(9),
        }
    }
}

/// Classify a file header. Returns [`CompressionType::None`] when no prefix matches.
#[must_use]
pub fn detect_compression(head: &[u8]) -> CompressionType {
    MAGIC_TABLE
        .iter()
        .find(|(magic, _)| head.starts_with(magic.as_slice()))
        .map_or(CompressionType::None, |(_, kind)| *kind)
}

/// Read the first two bytes of `path` and classify them.
///
/// # Errors
/// `IoFailure` if the file cannot be opened or read.
pub fn detect_file_compression(path: impl AsRef<Path>) -> Result<CompressionType> {
    let path = path.as_ref();
    let file = File::open(path).io_context(|| format!("open {}", path.display()))?;
    let mut head = Vec::with_capacity(2);
    file.take(2)
        .read_to_end(&mut head)
        .io_context(|| format!("read header of {}", path.display()))?;
    Ok(detect_compression(&head))
}

/// A writer that must be explicitly finished to flush codec trailers.
pub trait FinishWrite: Write {
    /// Flush everything, including any codec trailer.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn finish(self: Box<Self>) -> std::io::Result<()>;
}

impl<W: Write> FinishWrite for BufWriter<W> {
    fn finish(mut self: Box<Self>) -> std::io::Result<()> {
        self.flush()
    }
}

/// Pluggable compression codec.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; the built-ins are shared statics.
pub trait CompressionCodec: Send + Sync {
    fn kind(&self) -> CompressionType;

    /// Wrap a reader with decompression.
    ///
    /// # Errors
    /// Returns an error if the decoder cannot be set up.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    /// Wrap a writer with compression at `level` (0-9).
    ///
    /// # Errors
    /// Returns an error if the encoder cannot be set up.
    fn wrap_writer_dyn(
        &self,
        writer: Box<dyn Write>,
        level: u32,
    ) -> std::io::Result<Box<dyn FinishWrite>>;
}

#[cfg(feature = "compression-gzip")]
struct ZlibCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for ZlibCodec {
    fn kind(&self) -> CompressionType {
        CompressionType::Zlib
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::ZlibDecoder;
        Ok(Box::new(ZlibDecoder::new(reader)))
    }

    fn wrap_writer_dyn(
        &self,
        writer: Box<dyn Write>,
        level: u32,
    ) -> std::io::Result<Box<dyn FinishWrite>> {
        use flate2::write::ZlibEncoder;
        Ok(Box::new(ZlibEncoder::new(writer, flate2::Compression::new(level))))
    }
}

#[cfg(feature = "compression-gzip")]
impl<W: Write> FinishWrite for flate2::write::ZlibEncoder<W> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        let mut inner = (*self).finish()?;
        inner.flush()
    }
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn kind(&self) -> CompressionType {
        CompressionType::Gzip
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(
        &self,
        writer: Box<dyn Write>,
        level: u32,
    ) -> std::io::Result<Box<dyn FinishWrite>> {
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, flate2::Compression::new(level))))
    }
}

#[cfg(feature = "compression-gzip")]
impl<W: Write> FinishWrite for flate2::write::GzEncoder<W> {
    fn finish(self: Box<Self>) -> std::io::Result<()> {
        let mut inner = (*self).finish()?;
        inner.flush()
    }
}

static CODECS: &[&dyn CompressionCodec] = &[
    #[cfg(feature = "compression-gzip")]
    &ZlibCodec,
    #[cfg(feature = "compression-gzip")]
    &GzipCodec,
];

/// Look up the codec for `kind`. `None` means "no compression".
///
/// # Errors
/// `IoFailure` if the codec was compiled out.
pub fn codec_for(kind: CompressionType) -> Result<Option<&'static dyn CompressionCodec>> {
    if kind == CompressionType::None {
        return Ok(None);
    }
    CODECS
        .iter()
        .copied()
        .find(|codec| codec.kind() == kind)
        .map(Some)
        .ok_or_else(|| Error::io(format!("{} codec is not enabled in this build", kind.name())))
}

/// Open `path` for reading, decompressing with `kind`.
///
/// # Errors
/// `IoFailure` if the file cannot be opened or the codec is unavailable.
pub fn open_reader(path: impl AsRef<Path>, kind: CompressionType) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let file = File::open(path).io_context(|| format!("open {}", path.display()))?;
    let reader: Box<dyn Read> = Box::new(BufReader::new(file));
    match codec_for(kind)? {
        Some(codec) => codec
            .wrap_reader_dyn(reader)
            .io_context(|| format!("wrap reader with {} codec", kind.name())),
        None => Ok(reader),
    }
}

/// Create `path` for writing, compressing with `compression`.
///
/// # Errors
/// `IoFailure` if the file cannot be created or the codec is unavailable.
pub fn create_writer(
    path: impl AsRef<Path>,
    compression: Compression,
) -> Result<Box<dyn FinishWrite>> {
    let path = path.as_ref();
    let file = File::create(path).io_context(|| format!("create {}", path.display()))?;
    match codec_for(compression.kind)? {
        Some(codec) => codec
            .wrap_writer_dyn(Box::new(BufWriter::new(file)), compression.level)
            .io_context(|| format!("wrap writer with {} codec", compression.kind.name())),
        None => Ok(Box::new(BufWriter::new(file))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_compression() {
        assert_eq!(detect_compression(b"\x1f\x8b\x08\x00"), CompressionType::Gzip);
        assert_eq!(detect_compression(b"\x78\x9c\x01"), CompressionType::Zlib);
        assert_eq!(detect_compression(b"\x78\x01"), CompressionType::Zlib);
        assert_eq!(detect_compression(b"\x78\x5e"), CompressionType::Zlib);
        assert_eq!(detect_compression(b"\x78\xda"), CompressionType::Zlib);
        assert_eq!(detect_compression(b"\x78\x00"), CompressionType::None);
        assert_eq!(detect_compression(b"\x1f"), CompressionType::None);
        assert_eq!(detect_compression(b""), CompressionType::None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("GZIP".parse::<CompressionType>().unwrap(), CompressionType::Gzip);
        assert_eq!("zlib".parse::<CompressionType>().unwrap(), CompressionType::Zlib);
        assert_eq!("".parse::<CompressionType>().unwrap(), CompressionType::None);
        assert!("brotli".parse::<CompressionType>().is_err());
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(Compression::gzip(42).level, 9);
    }
}
