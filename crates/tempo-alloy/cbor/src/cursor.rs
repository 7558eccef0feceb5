//! A position-tracked read/write view over a fixed byte buffer.

/// Error returned when a read or write would run past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The requested size does not fit between the current position and the buffer end.
    #[error("position {position} + {requested} bytes is out of bounds for buffer of length {length}")]
    OutOfBounds {
        /// Position at the time of the access.
        position: usize,
        /// Number of bytes requested.
        requested: usize,
        /// Total length of the underlying buffer.
        length: usize,
    },
}

/// A cursor over a fixed-size byte buffer.
///
/// Multi-byte integers are read and written big-endian. The buffer never grows: encoders are
/// expected to size it exactly before writing, and every access that would cross the end of
/// the buffer fails with [`CursorError::OutOfBounds`] without moving the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<B> {
    bytes: B,
    position: usize,
}

impl<B: AsRef<[u8]>> Cursor<B> {
    /// Creates a cursor positioned at the start of `bytes`.
    pub const fn new(bytes: B) -> Self {
        Self { bytes, position: 0 }
    }

    /// Returns the current position.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the length of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.as_ref().len()
    }

    /// Returns `true` if the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of bytes between the position and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.len() - self.position
    }

    /// Moves the cursor to `position`.
    pub fn set_position(&mut self, position: usize) -> Result<(), CursorError> {
        if position > self.len() {
            return Err(CursorError::OutOfBounds { position, requested: 0, length: self.len() });
        }
        self.position = position;
        Ok(())
    }

    /// Consumes the cursor, returning the underlying buffer.
    pub fn into_inner(self) -> B {
        self.bytes
    }

    /// Returns the whole underlying buffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    #[inline]
    fn check(&self, requested: usize) -> Result<(), CursorError> {
        match self.position.checked_add(requested) {
            Some(end) if end <= self.len() => Ok(()),
            _ => Err(CursorError::OutOfBounds {
                position: self.position,
                requested,
                length: self.len(),
            }),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes.as_ref()[self.position..self.position + N]);
        self.position += N;
        Ok(out)
    }

    /// Returns the byte at the current position without advancing.
    pub fn inspect_u8(&self) -> Result<u8, CursorError> {
        self.check(1)?;
        Ok(self.bytes.as_ref()[self.position])
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8], CursorError> {
        self.check(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.bytes.as_ref()[start..start + len])
    }

    /// Returns all bytes from the position to the end of the buffer and moves to the end.
    pub fn read_remaining(&mut self) -> &[u8] {
        let start = self.position;
        self.position = self.len();
        &self.bytes.as_ref()[start..]
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Cursor<B> {
    /// Writes raw bytes at the current position.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), CursorError> {
        self.check(bytes.len())?;
        let start = self.position;
        self.bytes.as_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }

    /// Writes one byte.
    pub fn push_u8(&mut self, value: u8) -> Result<(), CursorError> {
        self.push_bytes(&[value])
    }

    /// Writes a big-endian `u16`.
    pub fn push_u16(&mut self, value: u16) -> Result<(), CursorError> {
        self.push_bytes(&value.to_be_bytes())
    }

    /// Writes a big-endian `u32`.
    pub fn push_u32(&mut self, value: u32) -> Result<(), CursorError> {
        self.push_bytes(&value.to_be_bytes())
    }

    /// Writes a big-endian `u64`.
    pub fn push_u64(&mut self, value: u64) -> Result<(), CursorError> {
        self.push_bytes(&value.to_be_bytes())
    }
}
