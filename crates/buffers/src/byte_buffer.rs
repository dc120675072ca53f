//! Fixed-capacity cursor buffer with big-endian accessors.

use crate::BufferError;

/// A fixed-capacity byte buffer with a cursor (`pos`) and a limit.
///
/// The buffer never grows: it is allocated once and reused for every
/// exchange. All accessors are bounds checked against `limit`, and every
/// fixed-width value is big-endian.
///
/// Each accessor comes in two forms. The plain form reads or writes at `pos`
/// and advances it; the `_at` form takes an explicit offset and leaves `pos`
/// untouched.
///
/// # Example
///
/// ```
/// use scripting_buffers::ByteBuffer;
///
/// let mut buf = ByteBuffer::new(16);
/// buf.clear();
/// buf.put_u8(0x01).unwrap();
/// buf.put_i32(-4).unwrap();
/// buf.put_u8_at(0, 0x02).unwrap();
///
/// buf.set_window(0, 5).unwrap();
/// assert_eq!(buf.get_u8().unwrap(), 0x02);
/// assert_eq!(buf.get_i32().unwrap(), -4);
/// ```
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Box<[u8]>,
    pos: usize,
    limit: usize,
}

macro_rules! fixed_width {
    ($($ty:ty => $put:ident, $put_at:ident, $get:ident, $get_at:ident;)*) => {
        $(
            #[doc = concat!("Writes a big-endian `", stringify!($ty), "` at `pos` and advances.")]
            #[inline]
            pub fn $put(&mut self, val: $ty) -> Result<(), BufferError> {
                self.write(None, &val.to_be_bytes())
            }

            #[doc = concat!("Writes a big-endian `", stringify!($ty), "` at `offset`.")]
            #[inline]
            pub fn $put_at(&mut self, offset: usize, val: $ty) -> Result<(), BufferError> {
                self.write(Some(offset), &val.to_be_bytes())
            }

            #[doc = concat!("Reads a big-endian `", stringify!($ty), "` at `pos` and advances.")]
            #[inline]
            pub fn $get(&mut self) -> Result<$ty, BufferError> {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                self.read(None, &mut raw)?;
                Ok(<$ty>::from_be_bytes(raw))
            }

            #[doc = concat!("Reads a big-endian `", stringify!($ty), "` at `offset`.")]
            #[inline]
            pub fn $get_at(&mut self, offset: usize) -> Result<$ty, BufferError> {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                self.read(Some(offset), &mut raw)?;
                Ok(<$ty>::from_be_bytes(raw))
            }
        )*
    };
}

impl ByteBuffer {
    /// Allocates a buffer of the given capacity with `pos = limit = 0`.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            limit: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Resets the cursor to zero and opens the whole capacity for writing.
    pub fn clear(&mut self) {
        self.pos = 0;
        self.limit = self.data.len();
    }

    /// Number of bytes between the cursor and the limit.
    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    pub fn set_pos(&mut self, pos: usize) -> Result<(), BufferError> {
        if pos > self.limit {
            return Err(self.out_of_bounds(pos, 0));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn set_limit(&mut self, limit: usize) -> Result<(), BufferError> {
        if limit > self.data.len() {
            return Err(self.out_of_bounds(limit, 0));
        }
        self.limit = limit;
        self.pos = self.pos.min(limit);
        Ok(())
    }

    /// Sets both the cursor and the limit, exposing `data[pos..limit]`.
    pub fn set_window(&mut self, pos: usize, limit: usize) -> Result<(), BufferError> {
        if pos > limit || limit > self.data.len() {
            return Err(self.out_of_bounds(pos, limit.saturating_sub(pos)));
        }
        self.pos = pos;
        self.limit = limit;
        Ok(())
    }

    /// Reserves `length` bytes and returns the offset they start at.
    ///
    /// The offset is `pos` when none is given, in which case `pos` advances
    /// past the reserved span. Fails if the span would cross `limit`.
    pub fn ensure_len(
        &mut self,
        length: usize,
        offset: Option<usize>,
    ) -> Result<usize, BufferError> {
        let start = offset.unwrap_or(self.pos);
        match start.checked_add(length) {
            Some(end) if end <= self.limit => {
                if offset.is_none() {
                    self.pos = end;
                }
                Ok(start)
            }
            _ => Err(self.out_of_bounds(start, length)),
        }
    }

    /// Drops the first `count` bytes, shifting the tail to the front.
    ///
    /// Bytes already buffered past `count` are kept, so a read that spanned
    /// more than one packet loses nothing.
    pub fn lshift(&mut self, count: usize) {
        let count = count.min(self.data.len());
        self.data.copy_within(count.., 0);
        self.pos = self.pos.saturating_sub(count);
        self.limit = self.data.len();
    }

    /// Bytes from the start of the buffer up to the cursor.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.pos]
    }

    /// Unread bytes between the cursor and the limit.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.pos..self.limit]
    }

    /// Bytes between the cursor and the limit, for reading into directly.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.pos..self.limit]
    }

    /// Advances the cursor after bytes were written through [`spare_mut`].
    ///
    /// [`spare_mut`]: ByteBuffer::spare_mut
    pub fn advance(&mut self, count: usize) -> Result<(), BufferError> {
        self.ensure_len(count, None).map(|_| ())
    }

    fn out_of_bounds(&self, offset: usize, length: usize) -> BufferError {
        BufferError::OutOfBounds {
            offset,
            length,
            limit: self.limit,
        }
    }

    fn write(&mut self, offset: Option<usize>, bytes: &[u8]) -> Result<(), BufferError> {
        let start = self.ensure_len(bytes.len(), offset)?;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn read(&mut self, offset: Option<usize>, out: &mut [u8]) -> Result<(), BufferError> {
        let start = self.ensure_len(out.len(), offset)?;
        out.copy_from_slice(&self.data[start..start + out.len()]);
        Ok(())
    }

    fixed_width! {
        u8 => put_u8, put_u8_at, get_u8, get_u8_at;
        i8 => put_i8, put_i8_at, get_i8, get_i8_at;
        u16 => put_u16, put_u16_at, get_u16, get_u16_at;
        i16 => put_i16, put_i16_at, get_i16, get_i16_at;
        i32 => put_i32, put_i32_at, get_i32, get_i32_at;
        i64 => put_i64, put_i64_at, get_i64, get_i64_at;
        f32 => put_f32, put_f32_at, get_f32, get_f32_at;
        f64 => put_f64, put_f64_at, get_f64, get_f64_at;
    }

    /// Writes a UTF-16 code unit as two big-endian bytes.
    pub fn put_char(&mut self, unit: u16) -> Result<(), BufferError> {
        self.put_u16(unit)
    }

    /// Reads a UTF-16 code unit.
    pub fn get_char(&mut self) -> Result<u16, BufferError> {
        self.get_u16()
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        self.write(None, bytes)
    }

    /// Writes a string as a `u16` byte length followed by its UTF-8 bytes.
    pub fn put_string(&mut self, s: &str) -> Result<(), BufferError> {
        let len = u16::try_from(s.len()).map_err(|_| BufferError::StringTooLong(s.len()))?;
        // Reserve the whole span first so a failed write leaves `pos` alone.
        let start = self.ensure_len(2 + s.len(), None)?;
        self.put_u16_at(start, len)?;
        self.data[start + 2..start + 2 + s.len()].copy_from_slice(s.as_bytes());
        Ok(())
    }

    /// Reads a `u16` length-prefixed UTF-8 string.
    pub fn get_string(&mut self) -> Result<String, BufferError> {
        let len = self.get_u16()? as usize;
        let start = self.ensure_len(len, None)?;
        std::str::from_utf8(&self.data[start..start + len])
            .map(str::to_owned)
            .map_err(|_| BufferError::InvalidUtf8)
    }
}
