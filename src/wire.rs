//! Major-type/argument primitives of the RFC 8949 wire format.

use crate::{CborError, ErrorCode};

/// Additional-info value announcing an indefinite length.
pub const AI_INDEFINITE: u8 = 31;
/// The "break" stop code terminating indefinite-length items.
pub const BREAK: u8 = 0xff;

#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub const fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn peek_u8(&self) -> Result<u8, CborError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| CborError::new(ErrorCode::UnexpectedEof, self.pos))
    }

    pub fn read_u8(&mut self) -> Result<u8, CborError> {
        let b = self.peek_u8()?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        let off = self.pos;
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| CborError::new(ErrorCode::LengthOverflow, off))?;
        if end > self.data.len() {
            return Err(CborError::new(ErrorCode::UnexpectedEof, off));
        }
        let s = &self.data[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    pub fn read_be_u16(&mut self) -> Result<u16, CborError> {
        let s = self.read_exact(2)?;
        Ok(u16::from_be_bytes([s[0], s[1]]))
    }

    pub fn read_be_u32(&mut self) -> Result<u32, CborError> {
        let s = self.read_exact(4)?;
        Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub fn read_be_u64(&mut self) -> Result<u64, CborError> {
        let s = self.read_exact(8)?;
        Ok(u64::from_be_bytes([
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
        ]))
    }

    /// Read the argument following an initial byte. `None` means indefinite length.
    pub fn read_argument(&mut self, ai: u8, off: usize) -> Result<Option<u64>, CborError> {
        match ai {
            0..=23 => Ok(Some(u64::from(ai))),
            24 => Ok(Some(u64::from(self.read_u8()?))),
            25 => Ok(Some(u64::from(self.read_be_u16()?))),
            26 => Ok(Some(u64::from(self.read_be_u32()?))),
            27 => Ok(Some(self.read_be_u64()?)),
            AI_INDEFINITE => Ok(None),
            _ => Err(CborError::new(ErrorCode::ReservedAdditionalInfo, off)),
        }
    }

    /// Read a definite argument, rejecting the indefinite marker.
    pub fn read_uint_arg(&mut self, ai: u8, off: usize) -> Result<u64, CborError> {
        self.read_argument(ai, off)?
            .ok_or_else(|| CborError::new(ErrorCode::InvalidIndefiniteLength, off))
    }
}

pub fn len_to_usize(len: u64, off: usize) -> Result<usize, CborError> {
    usize::try_from(len).map_err(|_| CborError::new(ErrorCode::LengthOverflow, off))
}

/// Append the shortest header for `major` with argument `value`.
pub fn write_header(out: &mut Vec<u8>, major: u8, value: u64) {
    debug_assert!(major <= 7);
    let mt = major << 5;
    if let Ok(v8) = u8::try_from(value) {
        if v8 < 24 {
            out.push(mt | v8);
        } else {
            out.push(mt | 24);
            out.push(v8);
        }
    } else if let Ok(v16) = u16::try_from(value) {
        out.push(mt | 25);
        out.extend_from_slice(&v16.to_be_bytes());
    } else if let Ok(v32) = u32::try_from(value) {
        out.push(mt | 26);
        out.extend_from_slice(&v32.to_be_bytes());
    } else {
        out.push(mt | 27);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

/// Append a header whose argument is a length.
pub fn write_len(out: &mut Vec<u8>, major: u8, len: usize) {
    // usize never exceeds u64 on supported targets.
    write_header(out, major, len as u64);
}
