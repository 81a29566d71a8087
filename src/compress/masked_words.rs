// src/compress/masked_words.rs

//! The bitmask run codec at the heart of GreggyBits.
//!
//! A run is up to eight 16-bit words sharing one mask byte. Mask bits are
//! read most-significant first; a set bit means the word is stored as a
//! one-byte table index, a clear bit means it is stored literally as two
//! big-endian bytes. An all-zero mask is a plain copy of `2 * n` bytes.

use super::gregg_table::GreggTable;
use crate::utils::bytes;
use crate::utils::error::{ResourceError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::{Cursor, Write};

/// Words per full run.
pub const RUN_WORDS: usize = 8;

fn check_run_len(n: usize) -> Result<()> {
    if n == 0 || n > RUN_WORDS {
        return Err(ResourceError::InvalidArg(format!(
            "run length must be 1..=8 words, got {}",
            n
        )));
    }
    Ok(())
}

/// Decodes `n` words from `src` under `mask`, appending them to `dst`.
///
/// The mask byte itself must already have been consumed. Returns how many
/// source bytes the run body occupied.
pub fn decode_run(
    src: &mut Cursor<&[u8]>,
    dst: &mut Vec<u8>,
    table: &GreggTable,
    mask: u8,
    n: usize,
) -> Result<usize> {
    check_run_len(n)?;
    let (start, _) = bytes::position(src);

    if mask == 0 {
        dst.extend_from_slice(bytes::take(src, n * 2, "literal run")?);
        return Ok(n * 2);
    }

    for bit in (RUN_WORDS - n..RUN_WORDS).rev() {
        let word = if mask & (1 << bit) != 0 {
            let index = bytes::read_u8(src, "table index")?;
            table.word(index).ok_or(ResourceError::TableIndexOutOfRange {
                index,
                table_len: table.len(),
            })?
        } else {
            bytes::read_u16(src, "literal word")?
        };
        dst.write_u16::<BigEndian>(word)?;
    }

    let (end, _) = bytes::position(src);
    Ok(end - start)
}

/// Encodes one run of `words` (1..=8 of them) as a mask byte followed by the
/// run body. For short runs the mask is left-justified.
pub fn encode_run<W: Write>(words: &[u16], table: &GreggTable, dst: &mut W) -> Result<()> {
    let n = words.len();
    check_run_len(n)?;

    let mut mask = 0u8;
    let mut body = Vec::with_capacity(n * 2);
    for &word in words {
        mask <<= 1;
        match table.index_of(word) {
            Some(index) => {
                mask |= 1;
                body.push(index);
            }
            None => body.write_u16::<BigEndian>(word)?,
        }
    }
    if n < RUN_WORDS {
        mask <<= RUN_WORDS - n;
    }

    dst.write_u8(mask)?;
    dst.write_all(&body)?;
    Ok(())
}
