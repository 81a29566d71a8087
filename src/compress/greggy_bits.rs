// src/compress/greggy_bits.rs

//! GreggyBits, the word-substitution compressor behind `dcmp` 2.
//!
//! A stream is the 6-byte Gregg sub-header, an optional dynamic table of
//! `tab_size + 1` big-endian words, and a body. The body is either a series
//! of bitmask runs (see [`masked_words`](super::masked_words)) or, in older
//! streams, one table index byte per word. An odd trailing byte is stored raw
//! at the end.
//!
//! The encoder only ever writes a custom table with bitmask runs; the
//! decoder accepts every combination.

use super::ext_header::{GREGG_DEF_PROC, GreggHeader};
use super::gregg_table::GreggTable;
use super::masked_words::{RUN_WORDS, decode_run, encode_run};
use crate::utils::bytes;
use crate::utils::error::{ResourceError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
#[cfg(feature = "debug-logging")]
use log::trace;
use std::io::Cursor;

/// Which lookup table the encoder should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableChoice {
    /// Let the encoder decide. Currently always resolves to `Custom`.
    #[default]
    Auto,
    /// Build and embed a table from word frequencies.
    Custom,
    /// Use the built-in table. Not implemented by the encoder.
    BuiltIn,
}

/// How the encoder should lay out the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunLayout {
    /// Let the encoder decide. Currently always resolves to `Bitmapped`.
    #[default]
    Auto,
    /// Mask byte per run of up to eight words.
    Bitmapped,
    /// One table index per word. Not implemented by the encoder.
    WholeByte,
}

/// Encoder parameters for GreggyBits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GreggParams {
    pub table: TableChoice,
    pub layout: RunLayout,
}

impl GreggParams {
    fn check_supported(&self) -> Result<()> {
        if self.table == TableChoice::BuiltIn {
            return Err(ResourceError::Unimplemented(
                "GreggyBits compression with the built-in table",
            ));
        }
        if self.layout == RunLayout::WholeByte {
            return Err(ResourceError::Unimplemented(
                "non-bitmapped GreggyBits compression",
            ));
        }
        Ok(())
    }
}

/// Decompresses a GreggyBits stream.
///
/// `src` starts at the Gregg sub-header, right after the generic extended
/// header; `unpacked_len` comes from that generic header.
pub fn decompress(src: &[u8], unpacked_len: usize) -> Result<Vec<u8>> {
    let mut src = Cursor::new(src);
    let header = GreggHeader::read(&mut src)?;

    let table = if header.has_dynamic_table() {
        let entries = header.tab_size as usize + 1;
        let mut words = Vec::with_capacity(entries);
        for _ in 0..entries {
            words.push(bytes::read_u16(&mut src, "dynamic table")?);
        }
        GreggTable::from_words(words)
    } else {
        GreggTable::builtin()
    };

    debug!(
        "GreggyBits: {} bytes, {} table of {} words, {}",
        unpacked_len,
        if header.has_dynamic_table() { "dynamic" } else { "built-in" },
        table.len(),
        if header.is_bitmapped() { "bitmapped" } else { "whole-byte" }
    );

    let n_words = unpacked_len >> 1;
    // Every source byte yields at most one word, so a bogus length cannot
    // force a huge allocation up front.
    let mut dst = Vec::with_capacity(unpacked_len.min(src.get_ref().len() * 2 + 1));

    if header.is_bitmapped() {
        for _run in 0..n_words / RUN_WORDS {
            let mask = bytes::read_u8(&mut src, "run mask")?;
            #[cfg(feature = "debug-logging")]
            trace!("GreggyBits: run {} mask 0x{:02X}", _run, mask);
            decode_run(&mut src, &mut dst, &table, mask, RUN_WORDS)?;
        }

        let trailing = n_words % RUN_WORDS;
        if trailing != 0 {
            let mask = bytes::read_u8(&mut src, "last run mask")?;
            #[cfg(feature = "debug-logging")]
            trace!("GreggyBits: last mask 0x{:02X}, {} words", mask, trailing);
            decode_run(&mut src, &mut dst, &table, mask, trailing)?;
        }
    } else {
        for _ in 0..n_words {
            let index = bytes::read_u8(&mut src, "table index")?;
            let word = table.word(index).ok_or(ResourceError::TableIndexOutOfRange {
                index,
                table_len: table.len(),
            })?;
            dst.write_u16::<BigEndian>(word)?;
        }
    }

    if unpacked_len & 1 != 0 {
        dst.push(bytes::read_u8(&mut src, "trailing byte")?);
    }

    Ok(dst)
}

/// Compresses `raw` into a GreggyBits stream (sub-header, table and body).
///
/// The caller prepends the generic extended header.
pub fn compress(raw: &[u8], params: &GreggParams) -> Result<Vec<u8>> {
    params.check_supported()?;

    let words: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let table = GreggTable::from_frequencies(&words);

    let mut dst = Vec::with_capacity(6 + table.len() * 2 + raw.len() + words.len() / RUN_WORDS + 2);

    GreggHeader {
        def_proc: GREGG_DEF_PROC,
        slop: 0,
        tab_size: (table.len() - 1) as u8,
        flags: GreggHeader::FLAG_DYNAMIC_TABLE | GreggHeader::FLAG_BITMAPPED,
    }
    .write(&mut dst)?;

    for &word in table.words() {
        dst.write_u16::<BigEndian>(word)?;
    }

    for run in words.chunks(RUN_WORDS) {
        encode_run(run, &table, &mut dst)?;
    }

    if let Some(&last) = raw.get(words.len() * 2) {
        dst.push(last);
    }

    debug!(
        "GreggyBits: compressed {} bytes to {} with a {}-word table",
        raw.len(),
        dst.len(),
        table.len()
    );

    Ok(dst)
}
