//! Fixed-capacity binary buffer used by the scripting wire protocol.
//!
//! # Overview
//!
//! - [`ByteBuffer`] - cursor/limit buffer with bounds-checked big-endian
//!   accessors, length-prefixed strings and front compaction
//!
//! # Example
//!
//! ```
//! use scripting_buffers::ByteBuffer;
//!
//! let mut buf = ByteBuffer::new(32);
//! buf.clear();
//! buf.put_string("java.lang.String").unwrap();
//! let written = buf.pos();
//!
//! buf.set_window(0, written).unwrap();
//! assert_eq!(buf.get_string().unwrap(), "java.lang.String");
//! ```

mod byte_buffer;

pub use byte_buffer::ByteBuffer;

/// Error type for buffer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// A read or write would cross the buffer limit.
    #[error("no more space in the buffer (offset: {offset}, length: {length}, limit: {limit})")]
    OutOfBounds {
        offset: usize,
        length: usize,
        limit: usize,
    },
    /// A string does not fit the `u16` length prefix.
    #[error("string of {0} bytes exceeds the u16 length prefix")]
    StringTooLong(usize),
    /// Invalid UTF-8 sequence.
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
}
