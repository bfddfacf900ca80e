//! Bounds checked little-endian reads over a borrowed byte buffer. Both the core dump
//! and ELF images are read with these.
use thiserror::Error;

/// A read that would have gone past the end of the buffer.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("read of {size} bytes at offset {offset:#x} is outside the {len} byte buffer")]
pub struct OutOfBounds {
    pub offset: u64,
    pub size: u64,
    pub len: usize,
}

#[derive(Clone, Copy)]
pub struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Note that these functions all return a Result because dumps and ELF images are
    /// sometimes truncated or corrupt and callers want to keep going when that happens.
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn slice(&self, offset: u64, size: u64) -> Result<&'a [u8], OutOfBounds> {
        let err = OutOfBounds {
            offset,
            size,
            len: self.bytes.len(),
        };
        let start = usize::try_from(offset).map_err(|_| err)?;
        let size = usize::try_from(size).map_err(|_| err)?;
        let end = start.checked_add(size).ok_or(err)?;
        self.bytes.get(start..end).ok_or(err)
    }

    /// Like slice but clamps to the end of the buffer instead of failing. Offsets past
    /// the end produce an empty slice.
    pub fn clamped(&self, offset: u64, size: u64) -> &'a [u8] {
        let len = self.bytes.len();
        let start = usize::try_from(offset).unwrap_or(len).min(len);
        let end = usize::try_from(size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .unwrap_or(len)
            .min(len);
        &self.bytes[start..end]
    }

    pub fn read_byte(&self, offset: u64) -> Result<u8, OutOfBounds> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_half(&self, offset: u64) -> Result<u16, OutOfBounds> {
        Ok(u16::from_le_bytes(self.array(offset)?))
    }

    pub fn read_word(&self, offset: u64) -> Result<u32, OutOfBounds> {
        Ok(u32::from_le_bytes(self.array(offset)?))
    }

    pub fn read_xword(&self, offset: u64) -> Result<u64, OutOfBounds> {
        Ok(u64::from_le_bytes(self.array(offset)?))
    }

    fn array<const N: usize>(&self, offset: u64) -> Result<[u8; N], OutOfBounds> {
        let mut result = [0; N];
        result.copy_from_slice(self.slice(offset, N as u64)?);
        Ok(result)
    }
}

/// Sequential reads with an advancing offset. Field order matters for every fixed
/// layout we decode so most decoding goes through one of these.
pub struct Stream<'a> {
    pub reader: Reader<'a>,
    pub offset: u64,
}

impl<'a> Stream<'a> {
    pub fn new(reader: Reader<'a>, offset: u64) -> Self {
        Stream { reader, offset }
    }

    pub fn read_byte(&mut self) -> Result<u8, OutOfBounds> {
        let byte = self.reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16, OutOfBounds> {
        let half = self.reader.read_half(self.offset)?;
        self.offset += 2;
        Ok(half)
    }

    pub fn read_word(&mut self) -> Result<u32, OutOfBounds> {
        let word = self.reader.read_word(self.offset)?;
        self.offset += 4;
        Ok(word)
    }

    pub fn read_xword(&mut self) -> Result<u64, OutOfBounds> {
        let xword = self.reader.read_xword(self.offset)?;
        self.offset += 8;
        Ok(xword)
    }
}

/// Returns the NUL terminated string starting at index within a string table. Index
/// can point into the middle of a string. Out of range indexes give an empty string and
/// a missing terminator runs to the end of the table.
pub fn c_string(table: &[u8], index: u32) -> String {
    let start = index as usize;
    if start >= table.len() {
        return String::new();
    }
    let tail = &table[start..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).into_owned()
}
