// src/cursor.rs
use crate::error::{BlackrockError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Bounds-checked, offset-addressed reads over a byte source.
///
/// Every read names its absolute offset explicitly, so a single cursor can
/// serve concurrent readers without any seek state. All multi-byte fields in
/// the NSx/NEV family are little-endian.
///
/// # Example
///
/// ```
/// use blackrock_rs::cursor::ByteCursor;
///
/// let data = [0x01u8, 0x02, 0x00, 0x00, 0x00];
/// let cursor = ByteCursor::new(&data);
/// assert_eq!(cursor.read_u8(0).unwrap(), 1);
/// assert_eq!(cursor.read_u32(1).unwrap(), 2);
/// assert!(cursor.read_u32(2).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data }
    }

    /// Total size of the underlying source in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: u64, len: usize) -> Result<&'a [u8]> {
        let start = self.check(offset, len)?;
        Ok(&self.data[start..start + len])
    }

    pub fn read_u8(&self, offset: u64) -> Result<u8> {
        let start = self.check(offset, 1)?;
        Ok(self.data[start])
    }

    pub fn read_u16(&self, offset: u64) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.bytes(offset, 2)?))
    }

    pub fn read_i16(&self, offset: u64) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.bytes(offset, 2)?))
    }

    pub fn read_u32(&self, offset: u64) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes(offset, 4)?))
    }

    pub fn read_u64(&self, offset: u64) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.bytes(offset, 8)?))
    }

    /// Read a fixed-width text field, trimming NUL and space padding.
    ///
    /// Header labels are stored as fixed byte arrays padded with zeros;
    /// undecodable bytes are replaced rather than rejected so one odd label
    /// cannot abort a header parse.
    pub fn read_fixed_str(&self, offset: u64, len: usize) -> Result<String> {
        let raw = self.bytes(offset, len)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).trim_end().to_string())
    }

    /// Read NUL-terminated text within a bounded window (comment packets).
    /// The terminator is optional; the window end also ends the string.
    pub fn read_cstr(&self, offset: u64, max_len: usize) -> Result<String> {
        let raw = self.bytes(offset, max_len)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).to_string())
    }

    /// Read a length-prefixed (u32) byte field.
    pub fn read_length_prefixed(&self, offset: u64) -> Result<&'a [u8]> {
        let len = self.read_u32(offset)? as usize;
        self.bytes(offset + 4, len)
    }

    fn check(&self, offset: u64, len: usize) -> Result<usize> {
        let end = offset.checked_add(len as u64);
        match end {
            Some(end) if end <= self.len() => Ok(offset as usize),
            _ => Err(BlackrockError::Truncated {
                offset,
                needed: len,
                available: self.len(),
            }),
        }
    }
}
