// src/utils/bytes.rs

//! Bounds-checked big-endian reads over an in-memory buffer.
//!
//! Every reader in the crate works on a `Cursor<&[u8]>`. These helpers wrap
//! the `byteorder` reads so a short buffer surfaces as
//! `ResourceError::Truncated` naming the field that could not be read.

use crate::utils::error::{ResourceError, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

/// Current offset and bytes left in `src`.
#[inline]
pub fn position(src: &Cursor<&[u8]>) -> (usize, usize) {
    let len = src.get_ref().len();
    let pos = (src.position() as usize).min(len);
    (pos, len - pos)
}

pub fn read_u8(src: &mut Cursor<&[u8]>, what: &'static str) -> Result<u8> {
    let (offset, available) = position(src);
    src.read_u8()
        .map_err(|e| ResourceError::from_read(e, what, offset, 1, available))
}

pub fn read_u16(src: &mut Cursor<&[u8]>, what: &'static str) -> Result<u16> {
    let (offset, available) = position(src);
    src.read_u16::<BigEndian>()
        .map_err(|e| ResourceError::from_read(e, what, offset, 2, available))
}

pub fn read_i16(src: &mut Cursor<&[u8]>, what: &'static str) -> Result<i16> {
    let (offset, available) = position(src);
    src.read_i16::<BigEndian>()
        .map_err(|e| ResourceError::from_read(e, what, offset, 2, available))
}

pub fn read_u32(src: &mut Cursor<&[u8]>, what: &'static str) -> Result<u32> {
    let (offset, available) = position(src);
    src.read_u32::<BigEndian>()
        .map_err(|e| ResourceError::from_read(e, what, offset, 4, available))
}

/// Borrows the next `len` bytes and advances past them.
pub fn take<'a>(src: &mut Cursor<&'a [u8]>, len: usize, what: &'static str) -> Result<&'a [u8]> {
    let (offset, available) = position(src);
    if len > available {
        return Err(ResourceError::Truncated {
            what,
            offset,
            needed: len,
            available,
        });
    }
    let buf: &'a [u8] = *src.get_ref();
    src.set_position((offset + len) as u64);
    Ok(&buf[offset..offset + len])
}

/// Moves `src` to an absolute offset, failing if it lies past the end.
pub fn seek_to(src: &mut Cursor<&[u8]>, offset: usize, what: &'static str) -> Result<()> {
    let len = src.get_ref().len();
    if offset > len {
        return Err(ResourceError::Truncated {
            what,
            offset,
            needed: 0,
            available: 0,
        });
    }
    src.set_position(offset as u64);
    Ok(())
}
