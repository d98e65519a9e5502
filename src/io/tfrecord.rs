//! TFRecord framing.
//!
//! Each record on disk is laid out as:
//!
//! ```text
//! u64 LE   length
//! u32 LE   masked crc32c of the 8 length bytes
//! [u8]     data
//! u32 LE   masked crc32c of data
//! ```
//!
//! The reader verifies both checksums. A clean end of input at a frame boundary
//! ends the stream; anything else (short frame, bad checksum) is a malformed record.

use crate::error::{Error, Result};
use crate::io::compression::{CompressionType, open_reader};
use crc::{CRC_32_ISCSI, Crc};
use std::io::{self, Read, Write};
use std::path::PathBuf;

const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);
const MASK_DELTA: u32 = 0xa282_ead8;

/// CRC-32C rotated and offset, as stored in record frames.
#[must_use]
pub fn masked_crc32c(data: &[u8]) -> u32 {
    CRC32C.checksum(data).rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Bytes a record of `len` data bytes occupies on disk.
#[must_use]
pub const fn framed_len(len: usize) -> usize {
    len + 16
}

pub struct TfRecordWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> TfRecordWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    /// Append one framed record.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&masked_crc32c(&len).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc32c(data).to_le_bytes())?;
        self.records += 1;
        Ok(())
    }

    #[must_use]
    pub const fn records_written(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct TfRecordReader<R: Read> {
    inner: R,
    index: usize,
    done: bool,
}

impl<R: Read> TfRecordReader<R> {
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            index: 0,
            done: false,
        }
    }

    /// Fill `buf` as far as the input allows; returns the number of bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read = 0;
        while read < buf.len() {
            match self.inner.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(read)
    }

    fn read_exact_or_malformed(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        let n = self.fill(buf)?;
        if n < buf.len() {
            return Err(Error::malformed(format!(
                "record #{} truncated in {what} ({n} of {} bytes)",
                self.index,
                buf.len()
            )));
        }
        Ok(())
    }

    fn read_crc(&mut self, what: &str) -> Result<u32> {
        let mut crc = [0u8; 4];
        self.read_exact_or_malformed(&mut crc, what)?;
        Ok(u32::from_le_bytes(crc))
    }

    /// Read the next record, or `None` at a clean end of input.
    ///
    /// # Errors
    /// `MalformedRecord` on truncation or checksum mismatch, `IoFailure` on read errors.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut len = [0u8; 8];
        match self.fill(&mut len)? {
            0 => return Ok(None),
            8 => {}
            n => {
                return Err(Error::malformed(format!(
                    "record #{} truncated in length ({n} of 8 bytes)",
                    self.index
                )));
            }
        }
        if self.read_crc("length checksum")? != masked_crc32c(&len) {
            return Err(Error::malformed(format!(
                "record #{} length checksum mismatch",
                self.index
            )));
        }

        let size = usize::try_from(u64::from_le_bytes(len))
            .map_err(|_| Error::malformed(format!("record #{} is too large", self.index)))?;
        let mut data = Vec::new();
        let read = (&mut self.inner).take(size as u64).read_to_end(&mut data)?;
        if read < size {
            return Err(Error::malformed(format!(
                "record #{} truncated in data ({read} of {size} bytes)",
                self.index
            )));
        }
        if self.read_crc("data checksum")? != masked_crc32c(&data) {
            return Err(Error::malformed(format!(
                "record #{} data checksum mismatch",
                self.index
            )));
        }
        self.index += 1;
        Ok(Some(data))
    }
}

impl<R: Read> Iterator for TfRecordReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.read_record().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Records from every file in `paths`, in order, decompressed with `kind`.
///
/// Errors carry the offending file as their source.
pub fn read_record_files(
    paths: &[PathBuf],
    kind: CompressionType,
) -> impl Iterator<Item = Result<Vec<u8>>> + '_ {
    paths.iter().flat_map(move |path| {
        let records: Box<dyn Iterator<Item = Result<Vec<u8>>>> = match open_reader(path, kind) {
            Ok(reader) => Box::new(TfRecordReader::new(reader)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        };
        records.map(move |r| {
            r.map_err(|e| match e.source {
                Some(_) => e,
                None => e.with_source(path.display().to_string()),
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn framed(records: &[&[u8]]) -> Vec<u8> {
        let mut w = TfRecordWriter::new(Vec::new());
        for r in records {
            w.write_record(r).unwrap();
        }
        w.into_inner()
    }

    #[test]
    fn test_frame_layout() {
        assert_eq!(CRC32C.checksum(b"123456789"), 0xe306_9283);

        let bytes = framed(&[b"abc"]);
        assert_eq!(bytes.len(), framed_len(3));
        assert_eq!(&bytes[..8], &3u64.to_le_bytes());
        assert_eq!(&bytes[8..12], &masked_crc32c(&3u64.to_le_bytes()).to_le_bytes());
        assert_eq!(&bytes[12..15], b"abc");
        assert_eq!(&bytes[15..], &masked_crc32c(b"abc").to_le_bytes());
    }

    #[test]
    fn test_read_back() {
        let bytes = framed(&[b"first", b"", b"third"]);
        let records: Vec<Vec<u8>> = TfRecordReader::new(bytes.as_slice())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records, vec![b"first".to_vec(), Vec::new(), b"third".to_vec()]);
    }

    #[test]
    fn test_truncated_frame() {
        let bytes = framed(&[b"payload"]);
        let mut reader = TfRecordReader::new(&bytes[..bytes.len() - 2]);
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedRecord);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_corrupted_data() {
        let mut bytes = framed(&[b"payload"]);
        bytes[13] ^= 0xff;
        let err = TfRecordReader::new(bytes.as_slice())
            .next()
            .unwrap()
            .unwrap_err();
        assert!(err.message.contains("data checksum"));
    }
}
