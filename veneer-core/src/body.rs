//! In-memory response body streams
//!
//! [`BodyStream`] is the replaceable body carried by every [`HttpResponse`].
//! It behaves like a small file: it has a cursor, can be truncated and
//! rewound, and implements [`Read`], [`Write`] and [`Seek`] so formatters can
//! write into it with the usual `std::io` tooling.
//!
//! Streams advertise what they support through [`StreamCapabilities`]. A
//! deferred data response refuses to wrap a body that cannot be read,
//! written, sought or detached.
//!
//! # Examples
//!
//! ```
//! use std::io::Write;
//! use veneer_core::body::BodyStream;
//!
//! let mut body = BodyStream::new();
//! body.write_all(b"Hello").unwrap();
//! assert_eq!(body.tell(), 5);
//!
//! body.rewind();
//! assert_eq!(body.contents().unwrap(), "Hello");
//! ```
//!
//! [`HttpResponse`]: crate::HttpResponse

use bytes::Bytes;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Operations a [`BodyStream`] supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCapabilities {
    pub readable: bool,
    pub writable: bool,
    pub seekable: bool,
    /// Whether the backing buffer can be separated from the stream.
    pub detachable: bool,
}

impl StreamCapabilities {
    /// Everything allowed.
    pub const fn all() -> Self {
        Self {
            readable: true,
            writable: true,
            seekable: true,
            detachable: true,
        }
    }

    /// Nothing allowed. This is the state of a stream after [`BodyStream::detach`].
    pub const fn none() -> Self {
        Self {
            readable: false,
            writable: false,
            seekable: false,
            detachable: false,
        }
    }
}

impl Default for StreamCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// A position-tracking, in-memory body.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BodyStream {
    buffer: Vec<u8>,
    position: usize,
    capabilities: StreamCapabilities,
}

impl BodyStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream over an existing buffer, positioned at the start.
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            position: 0,
            capabilities: StreamCapabilities::all(),
        }
    }

    /// Restrict (or widen) what this stream allows.
    pub fn with_capabilities(mut self, capabilities: StreamCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn capabilities(&self) -> StreamCapabilities {
        self.capabilities
    }

    pub fn is_readable(&self) -> bool {
        self.capabilities.readable
    }

    pub fn is_writable(&self) -> bool {
        self.capabilities.writable
    }

    pub fn is_seekable(&self) -> bool {
        self.capabilities.seekable
    }

    /// Size of the stream in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Current cursor position.
    pub fn tell(&self) -> usize {
        self.position
    }

    /// Move the cursor back to the start.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Resize the buffer to `size` bytes. The cursor is left where it is.
    pub fn truncate(&mut self, size: usize) {
        self.buffer.resize(size, 0);
    }

    /// Drop all content and rewind.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.position = 0;
    }

    /// Write a string at the cursor.
    pub fn write_str(&mut self, content: &str) -> io::Result<usize> {
        self.write_all(content.as_bytes())?;
        Ok(content.len())
    }

    /// Read everything from the cursor to the end.
    ///
    /// Invalid UTF-8 sequences are replaced, matching how the body is shown
    /// by [`fmt::Display`].
    pub fn contents(&mut self) -> io::Result<String> {
        let mut raw = Vec::new();
        self.read_to_end(&mut raw)?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// The whole buffer, regardless of the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Snapshot of the whole buffer as `Bytes`.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buffer)
    }

    /// Separate the backing buffer from the stream.
    ///
    /// Returns `None` when the stream does not allow detaching. After a
    /// successful detach the stream is empty and unusable.
    pub fn detach(&mut self) -> Option<Vec<u8>> {
        if !self.capabilities.detachable {
            return None;
        }

        self.position = 0;
        self.capabilities = StreamCapabilities::none();
        Some(std::mem::take(&mut self.buffer))
    }

    fn unsupported(operation: &str) -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("Stream is not {operation}"),
        )
    }
}

impl Read for BodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.capabilities.readable {
            return Err(Self::unsupported("readable"));
        }

        let start = self.position.min(self.buffer.len());
        let available = &self.buffer[start..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position = start + count;
        Ok(count)
    }
}

impl Write for BodyStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.capabilities.writable {
            return Err(Self::unsupported("writable"));
        }

        // Writing past the end pads the gap with zeroes, like a sparse file.
        if self.position > self.buffer.len() {
            self.buffer.resize(self.position, 0);
        }

        let end = self.position + buf.len();
        let overlap = self.buffer.len().min(end) - self.position;
        self.buffer[self.position..self.position + overlap].copy_from_slice(&buf[..overlap]);
        self.buffer.extend_from_slice(&buf[overlap..]);
        self.position = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BodyStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if !self.capabilities.seekable {
            return Err(Self::unsupported("seekable"));
        }

        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(offset) => self.buffer.len() as i128 + offset as i128,
            SeekFrom::Current(offset) => self.position as i128 + offset as i128,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot seek to a negative position",
            ));
        }

        self.position = target as usize;
        Ok(self.position as u64)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream")
            .field("len", &self.buffer.len())
            .field("position", &self.position)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Full content from the start of the stream.
impl fmt::Display for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.buffer))
    }
}

impl From<&str> for BodyStream {
    fn from(content: &str) -> Self {
        Self::from_buffer(content.as_bytes().to_vec())
    }
}

impl From<String> for BodyStream {
    fn from(content: String) -> Self {
        Self::from_buffer(content.into_bytes())
    }
}

impl From<Vec<u8>> for BodyStream {
    fn from(buffer: Vec<u8>) -> Self {
        Self::from_buffer(buffer)
    }
}

impl From<Bytes> for BodyStream {
    fn from(bytes: Bytes) -> Self {
        Self::from_buffer(bytes.to_vec())
    }
}

/// Creates body streams.
pub trait StreamFactory: Send + Sync {
    /// Create a stream holding `content`.
    fn create_stream(&self, content: &str) -> BodyStream {
        self.create_stream_from_buffer(content.as_bytes().to_vec())
    }

    /// Create a stream over a buffer previously detached from another stream.
    fn create_stream_from_buffer(&self, buffer: Vec<u8>) -> BodyStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let mut body = BodyStream::new();
        body.write_str("Hello World").unwrap();

        assert_eq!(body.tell(), 11);
        assert_eq!(body.contents().unwrap(), "");

        body.rewind();
        assert_eq!(body.contents().unwrap(), "Hello World");
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut body = BodyStream::from("Hello World");
        body.seek(SeekFrom::Start(6)).unwrap();
        body.write_str("Rust!").unwrap();

        assert_eq!(body.to_string(), "Hello Rust!");
    }

    #[test]
    fn test_clear_truncates_and_rewinds() {
        let mut body = BodyStream::from("stale");
        body.seek(SeekFrom::End(0)).unwrap();
        body.clear();

        assert!(body.is_empty());
        assert_eq!(body.tell(), 0);

        body.write_str("new").unwrap();
        assert_eq!(body.to_string(), "new");
    }

    #[test]
    fn test_truncate_keeps_cursor() {
        let mut body = BodyStream::from("abcdef");
        body.seek(SeekFrom::Start(4)).unwrap();
        body.truncate(2);

        assert_eq!(body.len(), 2);
        assert_eq!(body.tell(), 4);
    }

    #[test]
    fn test_write_past_end_pads() {
        let mut body = BodyStream::from("ab");
        body.seek(SeekFrom::Start(4)).unwrap();
        body.write_all(b"c").unwrap();

        assert_eq!(body.as_bytes(), b"ab\0\0c");
    }

    #[test]
    fn test_negative_seek_fails() {
        let mut body = BodyStream::from("abc");
        let err = body.seek(SeekFrom::Current(-10)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_capabilities_are_enforced() {
        let mut body = BodyStream::new().with_capabilities(StreamCapabilities {
            writable: false,
            ..StreamCapabilities::all()
        });

        let err = body.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(body.is_readable());
        assert!(!body.is_writable());
    }

    #[test]
    fn test_detach() {
        let mut body = BodyStream::from("payload");
        assert_eq!(body.detach(), Some(b"payload".to_vec()));
        assert!(body.is_empty());
        assert!(!body.is_readable());
        assert_eq!(body.detach(), None);
    }
}
