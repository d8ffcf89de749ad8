//! The byte source abstraction the reader and traversal engine parse
//! against: any `Read + Seek`, so callers can hand in a `File`, a
//! `Cursor<Vec<u8>>`, or anything else that implements the pair.

use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::error::Result;

/// A seekable byte source. Blanket-implemented for anything that is
/// already `Read + Seek`, favoring a trait alias over a bespoke reader
/// wrapper.
pub trait Source: Read + Seek {}

impl<T: Read + Seek> Source for T {}

/// `BufReader` capacity for [`BufferedSource`]. Kept small: access here
/// is seek-dominated (jump table resolution, the tail scan) rather than
/// a long sequential read, so a large buffer mostly gets invalidated by
/// the next seek before it pays for itself.
const BUFFERED_SOURCE_CAPACITY: usize = 8 * 1024;

/// Wraps a `Read + Seek` source in a small `BufReader`, for callers
/// whose underlying source (e.g. a raw `File`) would otherwise issue one
/// syscall per header byte during sequential runs (header reads, payload
/// decoding). `Seek` passes straight through, which discards the
/// `BufReader`'s buffer per the standard library's own contract — this
/// is still a net win because most of a parse's reads are short and
/// sequential relative to the element currently being walked.
pub struct BufferedSource<R> {
    inner: BufReader<R>,
}

impl<R: Read> BufferedSource<R> {
    /// Wraps `inner` with the default buffer capacity.
    pub fn new(inner: R) -> Self {
        BufferedSource {
            inner: BufReader::with_capacity(BUFFERED_SOURCE_CAPACITY, inner),
        }
    }
}

impl<R: Read> Read for BufferedSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek> Seek for BufferedSource<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Reads `len` bytes starting at the current position.
pub(crate) fn read_vec(source: &mut impl Source, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    source.read_exact(&mut buf)?;
    Ok(buf)
}

/// The source's current absolute offset.
pub(crate) fn position(source: &mut impl Source) -> Result<u64> {
    Ok(source.stream_position()?)
}

/// Seeks to an absolute offset.
pub(crate) fn seek_to(source: &mut impl Source, offset: u64) -> Result<()> {
    source.seek(SeekFrom::Start(offset))?;
    Ok(())
}

/// The total length of the source, restoring the original position.
pub(crate) fn len(source: &mut impl Source) -> Result<u64> {
    let current = source.stream_position()?;
    let end = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(current))?;
    Ok(end)
}

/// Reads up to `max_len` bytes starting at `offset`, for the traversal
/// engine's chunked root search. Short reads near EOF are not an error:
/// the returned vector is simply shorter than requested.
pub(crate) fn read_chunk(source: &mut impl Source, offset: u64, max_len: usize) -> Result<Vec<u8>> {
    seek_to(source, offset)?;
    let mut buf = vec![0u8; max_len];
    let mut filled = 0;
    while filled < max_len {
        let n = source.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn chunk_read_truncates_near_eof() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let chunk = read_chunk(&mut cursor, 3, 10).unwrap();
        assert_eq!(chunk, vec![4, 5]);
    }

    #[test]
    fn len_restores_position() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        seek_to(&mut cursor, 4).unwrap();
        let total = len(&mut cursor).unwrap();
        assert_eq!(total, 16);
        assert_eq!(position(&mut cursor).unwrap(), 4);
    }
}
