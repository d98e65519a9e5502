//! Greedy byte-budget splitting of a serialized record stream into shards.
//!
//! Records are never split or reordered. A shard is closed when the next record
//! would push it over the budget, unless the shard is still empty; so a single
//! oversized record gets a shard of its own. The last shard is always emitted,
//! even when empty, which makes an empty input produce exactly one empty shard.

use crate::error::Result;

/// Default per-shard budget: 50 MiB.
pub const DEFAULT_MAX_SHARD_BYTES: u64 = 50 * 1024 * 1024;

/// Convert a budget in mebibytes to bytes.
#[must_use]
pub const fn mib(megabytes: u64) -> u64 {
    megabytes * 1024 * 1024
}

/// One output file's worth of serialized records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shard {
    records: Vec<Vec<u8>>,
    byte_size: u64,
}

impl Shard {
    #[must_use]
    pub fn records(&self) -> &[Vec<u8>] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Vec<u8>> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the serialized sizes of the records.
    #[must_use]
    pub const fn byte_size(&self) -> u64 {
        self.byte_size
    }

    fn push(&mut self, record: Vec<u8>) {
        self.byte_size += record.len() as u64;
        self.records.push(record);
    }
}

/// Iterator adapter grouping records into [`Shard`]s.
///
/// Errors from the upstream stream are passed through and end the iteration.
pub struct ShardSplitter<I> {
    records: I,
    max_bytes: Option<u64>,
    current: Shard,
    done: bool,
}

impl<I> ShardSplitter<I>
where
    I: Iterator<Item = Result<Vec<u8>>>,
{
    /// `max_bytes` of `None` puts the whole stream into one shard.
    pub fn new(records: I, max_bytes: Option<u64>) -> Self {
        Self {
            records,
            max_bytes,
            current: Shard::default(),
            done: false,
        }
    }

    fn would_overflow(&self, size: u64) -> bool {
        self.max_bytes
            .is_some_and(|max| !self.current.is_empty() && self.current.byte_size + size > max)
    }
}

impl<I> Iterator for ShardSplitter<I>
where
    I: Iterator<Item = Result<Vec<u8>>>,
{
    type Item = Result<Shard>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.records.next() {
                Some(Ok(record)) => {
                    if self.would_overflow(record.len() as u64) {
                        let full = std::mem::take(&mut self.current);
                        self.current.push(record);
                        return Some(Ok(full));
                    }
                    self.current.push(record);
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    return Some(Ok(std::mem::take(&mut self.current)));
                }
            }
        }
    }
}

/// Split `records` into shards of at most `max_bytes` each.
pub fn split_by_size<I>(records: I, max_bytes: Option<u64>) -> ShardSplitter<I::IntoIter>
where
    I: IntoIterator<Item = Result<Vec<u8>>>,
{
    ShardSplitter::new(records.into_iter(), max_bytes)
}
