//! Deterministic synthetic content source
//!
//! A `ContentSource` is a virtual byte sequence of a given length. Nothing is
//! buffered: every byte is a function of its offset, so a source can describe
//! a terabyte payload and still be positioned anywhere in constant time.
//!
//! Layout for a sequence of length `L >= 2`:
//!
//! ```text
//! offset   0   1   2   3  ...  26  27  28  ...  L-1
//! byte     |   A   B   C  ...  Z   -   A   ...   |
//! ```

use super::ContentError;
use std::io::{self, Read, Seek, SeekFrom};
use std::num::NonZeroU64;

/// Characters cycled through to fill the interior of a sequence
pub const ALPHABET: &[u8; 27] = b"-ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Marker stamped on the first and last byte of a sequence
pub const BOUNDARY: u8 = b'|';

/// Result of a single `read_chunk` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes written into the destination buffer
    pub written: usize,
    /// Whether the sequence is exhausted after this call
    pub end_of_stream: bool,
}

/// Per-request generator over a virtual byte sequence
#[derive(Debug, Clone)]
pub struct ContentSource {
    length: u64,
    position: u64,
}

impl ContentSource {
    pub const fn new(length: NonZeroU64) -> Self {
        Self {
            length: length.get(),
            position: 0,
        }
    }

    /// Total length of the virtual sequence
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Current read cursor
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Reads stop once the cursor reaches this offset
    const fn upper_bound(&self) -> u64 {
        self.length - 1
    }

    /// Fill `buf` from the current position
    ///
    /// A fresh source always starts with the boundary marker. When the fill
    /// reaches the upper bound the last byte written by this call is replaced
    /// by the boundary marker, whichever offset it held.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let upper = self.upper_bound();

        if self.position >= upper {
            return ReadOutcome {
                written: 0,
                end_of_stream: true,
            };
        }
        if buf.is_empty() {
            return ReadOutcome {
                written: 0,
                end_of_stream: false,
            };
        }

        let mut written = 0;
        if self.position == 0 {
            buf[0] = BOUNDARY;
            self.position = 1;
            written = 1;
        }

        // position <= upper here, so at least one offset is left to emit
        let room = (buf.len() - written) as u64;
        let count = room.min(self.length - self.position);
        // count <= buf.len(), the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        let end = written + count as usize;
        fill_cyclic(&mut buf[written..end], self.position);
        self.position += count;
        written = end;

        let end_of_stream = self.position >= upper;
        if end_of_stream {
            buf[written - 1] = BOUNDARY;
        }

        ReadOutcome {
            written,
            end_of_stream,
        }
    }
}

impl Read for ContentSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_chunk(buf).written)
    }
}

impl Seek for ContentSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(offset) => i128::from(self.position) + i128::from(offset),
            SeekFrom::End(offset) => i128::from(self.upper_bound()) + i128::from(offset),
        };

        let position = u64::try_from(target).map_err(|_| ContentError::InvalidSeek(target))?;
        self.position = position;
        Ok(position)
    }
}

/// Offset-exact reader over a `ContentSource`
///
/// A read that stops with the cursor on the upper bound stamps the boundary on
/// an interior offset, and a cursor parked on the upper bound reads nothing.
/// Range delivery starts and stops at arbitrary offsets, so this reader widens
/// such reads by one byte at the tail and trims the extra byte. Every offset
/// then carries the same byte as in a full read from offset 0.
#[derive(Debug, Clone)]
pub struct SeekableContent {
    inner: ContentSource,
}

impl SeekableContent {
    pub const fn new(inner: ContentSource) -> Self {
        Self { inner }
    }

    /// Bytes a full read from offset 0 produces
    ///
    /// A length-1 sequence never emits its only byte.
    pub const fn delivered_len(&self) -> u64 {
        if self.inner.length < 2 {
            0
        } else {
            self.inner.length
        }
    }

    pub const fn position(&self) -> u64 {
        self.inner.position
    }

    fn read_last_offset(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let length = self.inner.length;
        self.inner.seek(SeekFrom::Start(length - 2))?;
        let mut pair = [0u8; 2];
        let n = self.inner.read(&mut pair)?;
        self.inner.seek(SeekFrom::Start(length))?;
        if n < 2 {
            return Ok(0);
        }
        buf[0] = pair[1];
        Ok(1)
    }

    fn read_widened(&mut self, buf: &mut [u8], want: usize) -> io::Result<usize> {
        let start = self.inner.position;
        let mut wide = vec![0u8; want + 1];
        let n = self.inner.read(&mut wide)?;
        let keep = n.min(want);
        buf[..keep].copy_from_slice(&wide[..keep]);
        self.inner.seek(SeekFrom::Start(start + keep as u64))?;
        Ok(keep)
    }
}

impl Read for SeekableContent {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let length = self.inner.length;
        let position = self.inner.position;
        if buf.is_empty() || self.delivered_len() == 0 || position >= length {
            return Ok(0);
        }

        let upper = length - 1;
        if position == upper {
            return self.read_last_offset(buf);
        }

        // want <= buf.len(), the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        let want = (buf.len() as u64).min(length - position) as usize;
        if position + want as u64 == upper {
            return self.read_widened(buf, want);
        }
        self.inner.read(buf)
    }
}

impl Seek for SeekableContent {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Copy the alphabet into `dst` as if `dst[0]` sat at absolute `offset`
fn fill_cyclic(dst: &mut [u8], offset: u64) {
    // offset % 27 < 27, the cast cannot truncate
    #[allow(clippy::cast_possible_truncation)]
    let mut idx = (offset % ALPHABET.len() as u64) as usize;
    let mut filled = 0;
    while filled < dst.len() {
        let take = (ALPHABET.len() - idx).min(dst.len() - filled);
        dst[filled..filled + take].copy_from_slice(&ALPHABET[idx..idx + take]);
        filled += take;
        idx = 0;
    }
}

/// Logical byte at `offset` of a sequence of `length` bytes
///
/// Returns `None` for offsets a source of that length never emits.
///
/// # Examples
/// ```
/// use whoami::content::source::{expected_byte, BOUNDARY};
///
/// assert_eq!(expected_byte(10, 0), Some(BOUNDARY));
/// assert_eq!(expected_byte(10, 1), Some(b'A'));
/// assert_eq!(expected_byte(10, 9), Some(BOUNDARY));
/// assert_eq!(expected_byte(10, 10), None);
/// assert_eq!(expected_byte(1, 0), None);
/// ```
pub fn expected_byte(length: u64, offset: u64) -> Option<u8> {
    if length < 2 || offset >= length {
        return None;
    }
    if offset == 0 || offset == length - 1 {
        return Some(BOUNDARY);
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(ALPHABET[(offset % ALPHABET.len() as u64) as usize])
}
