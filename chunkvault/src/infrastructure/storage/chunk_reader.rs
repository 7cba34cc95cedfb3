// /////////////////////////////////////////////////////////////////////////////
// ChunkVault
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Lazy Chunk Reader
//!
//! A lazy view over one chunk's payload. The reader holds a single
//! contiguous cached window of the payload; reads inside the window are
//! served from memory, reads outside it fetch only the missing bytes from
//! the underlying store and grow the window to cover the union of every
//! request so far.
//!
//! Readers are opened through [`ChunkReaderBuilder`], whose cache presets
//! decide what gets prefetched:
//!
//! | Preset            | Initial cached range          |
//! |-------------------|-------------------------------|
//! | `magic_number(n)` | `[0, min(n, size))`           |
//! | `header(n)`       | `[0, min(n, size))`           |
//! | `full()`          | `[0, size)`                   |
//! | `range(lo..hi)`   | `[lo, min(hi, size))`         |
//!
//! Requests outside `[0, size)` clamp to the payload rather than erroring.
//! `close` is idempotent; reads on a closed reader fail with
//! [`ChunkError::HandleClosed`].

use std::ops::Range;
use std::sync::Arc;

use chunkvault_domain::{ChunkError, ChunkId, ChunkStore};

const DEFAULT_HEADER_BYTES: u64 = 4096;

/// Prefetch pattern applied when a reader opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePattern {
    MagicNumber(u64),
    Header(u64),
    Full,
    Range(u64, u64),
}

/// Builder for [`ChunkReader`].
pub struct ChunkReaderBuilder {
    store: Arc<dyn ChunkStore>,
    id: ChunkId,
    pattern: CachePattern,
}

impl ChunkReaderBuilder {
    pub fn new(store: Arc<dyn ChunkStore>, id: ChunkId) -> Self {
        Self {
            store,
            id,
            pattern: CachePattern::Header(DEFAULT_HEADER_BYTES),
        }
    }

    /// Prefetch the first `max_bytes` bytes, sized for magic-number probes.
    pub fn magic_number(mut self, max_bytes: u64) -> Self {
        self.pattern = CachePattern::MagicNumber(max_bytes);
        self
    }

    /// Prefetch the first `max_bytes` bytes.
    pub fn header(mut self, max_bytes: u64) -> Self {
        self.pattern = CachePattern::Header(max_bytes);
        self
    }

    /// Prefetch the whole payload.
    pub fn full(mut self) -> Self {
        self.pattern = CachePattern::Full;
        self
    }

    /// Prefetch an explicit byte range.
    pub fn range(mut self, range: Range<u64>) -> Self {
        self.pattern = CachePattern::Range(range.start, range.end);
        self
    }

    /// Probes the chunk and opens the reader; `Ok(None)` when the chunk does
    /// not exist.
    pub async fn open(self) -> Result<Option<ChunkReader>, ChunkError> {
        let size = match self.store.size(&self.id).await? {
            Some(size) => size,
            None => return Ok(None),
        };

        let (start, end) = match self.pattern {
            CachePattern::MagicNumber(n) | CachePattern::Header(n) => (0, n.min(size)),
            CachePattern::Full => (0, size),
            CachePattern::Range(lo, hi) => {
                let lo = lo.min(size);
                (lo, hi.min(size).max(lo))
            }
        };

        let mut reader = ChunkReader {
            store: self.store,
            id: self.id,
            size,
            cache: None,
            closed: false,
        };
        if end > start || size == 0 {
            let bytes = reader.fetch(start, end - start).await?;
            reader.cache = Some(CacheWindow { start, bytes });
        }
        Ok(Some(reader))
    }
}

struct CacheWindow {
    start: u64,
    bytes: Vec<u8>,
}

impl CacheWindow {
    fn end(&self) -> u64 {
        self.start + self.bytes.len() as u64
    }

    fn covers(&self, lo: u64, hi: u64) -> bool {
        self.start <= lo && hi <= self.end()
    }
}

/// Lazy, cache-expanding view over one chunk's payload.
pub struct ChunkReader {
    store: Arc<dyn ChunkStore>,
    id: ChunkId,
    size: u64,
    cache: Option<CacheWindow>,
    closed: bool,
}

impl ChunkReader {
    pub fn id(&self) -> &ChunkId {
        &self.id
    }

    /// Payload size at open time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The currently cached byte range, when any bytes are cached.
    pub fn cached_range(&self) -> Option<Range<u64>> {
        self.cache.as_ref().map(|w| w.start..w.end())
    }

    /// True iff the cached range equals `[0, size)`.
    pub fn is_fully_cached(&self) -> bool {
        match &self.cache {
            Some(window) => window.start == 0 && window.end() == self.size,
            None => self.size == 0,
        }
    }

    /// Drops the cached bytes; the next read fetches again.
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Closes the reader. Idempotent; subsequent reads fail.
    pub fn close(&mut self) {
        self.closed = true;
        self.cache = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads `range`, clamped to `[0, size)`, growing the cache to cover it.
    pub async fn read(&mut self, range: Range<u64>) -> Result<Vec<u8>, ChunkError> {
        if self.closed {
            return Err(ChunkError::HandleClosed(format!(
                "reader for chunk {} is closed",
                self.id
            )));
        }

        let lo = range.start.min(self.size);
        let hi = range.end.min(self.size).max(lo);
        if hi == lo {
            return Ok(Vec::new());
        }

        self.ensure_cached(lo, hi).await?;
        let window = self.cache.as_ref().expect("window populated by ensure_cached");
        let offset = (lo - window.start) as usize;
        let len = (hi - lo) as usize;
        Ok(window.bytes[offset..offset + len].to_vec())
    }

    /// Reads the first `n` bytes for magic-number inspection.
    pub async fn read_magic_number(&mut self, n: u64) -> Result<Vec<u8>, ChunkError> {
        self.read(0..n).await
    }

    /// Reads the first `n` bytes.
    pub async fn read_header(&mut self, n: u64) -> Result<Vec<u8>, ChunkError> {
        self.read(0..n).await
    }

    /// Reads the last `n` bytes.
    pub async fn read_tail(&mut self, n: u64) -> Result<Vec<u8>, ChunkError> {
        self.read(self.size.saturating_sub(n)..self.size).await
    }

    /// Reads the whole payload.
    pub async fn read_full(&mut self) -> Result<Vec<u8>, ChunkError> {
        self.read(0..self.size).await
    }

    async fn fetch(&self, start: u64, len: u64) -> Result<Vec<u8>, ChunkError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        self.store
            .read_range(&self.id, start, len)
            .await?
            .ok_or_else(|| ChunkError::ChunkNotFound(format!("chunk {} vanished mid-read", self.id)))
    }

    /// Expands the cache window to cover `[lo, hi)`, fetching only the
    /// missing prefix and suffix.
    async fn ensure_cached(&mut self, lo: u64, hi: u64) -> Result<(), ChunkError> {
        let (window_start, window_end) = match &self.cache {
            Some(window) if window.covers(lo, hi) => return Ok(()),
            Some(window) => (window.start, window.end()),
            None => {
                let bytes = self.fetch(lo, hi - lo).await?;
                self.cache = Some(CacheWindow { start: lo, bytes });
                return Ok(());
            }
        };

        let new_start = lo.min(window_start);
        let new_end = hi.max(window_end);
        let prefix = self.fetch(new_start, window_start - new_start).await?;
        let suffix = self.fetch(window_end, new_end - window_end).await?;

        let window = self.cache.as_mut().expect("window present on this path");
        let mut bytes = prefix;
        bytes.append(&mut window.bytes);
        bytes.extend_from_slice(&suffix);
        window.start = new_start;
        window.bytes = bytes;
        Ok(())
    }
}
