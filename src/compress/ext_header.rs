// src/compress/ext_header.rs

//! The extended resource header that prefixes every compressed resource,
//! and the sniffer that classifies a blob by it.
//!
//! Layout (big-endian):
//!
//! | offset | size | field                                    |
//! |--------|------|------------------------------------------|
//! | 0      | 4    | signature `0xA89F6572`                   |
//! | 4      | 2    | header length, 18 in practice            |
//! | 6      | 1    | format version (8 = Donn, 9 = Gregg)     |
//! | 7      | 1    | attributes, bit 0 = payload compressed   |
//! | 8      | 4    | uncompressed length                      |
//! | 12     | 6    | format-specific sub-header               |

use crate::utils::bytes;
use crate::utils::error::{ResourceError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use std::fmt;
use std::io::{Cursor, Write};
use std::str::FromStr;

pub const EXT_HEADER_SIGNATURE: u32 = 0xA89F_6572;
/// Header length recorded in the header itself: generic part plus sub-header.
pub const EXT_HEADER_LEN: u16 = 18;
/// Size of the generic part preceding the sub-header.
pub const GENERIC_HEADER_SIZE: usize = 12;
pub const DONN_VERSION: u8 = 8;
pub const GREGG_VERSION: u8 = 9;
/// The `dcmp` resource id a GreggyBits stream names.
pub const GREGG_DEF_PROC: u16 = 2;
const ATTR_COMPRESSED: u8 = 0x01;

/// How a resource's on-disk bytes are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionFormat {
    GreggyBits,
    DonnBits,
    /// Anything the sniffer does not recognise; passed through untouched.
    UnknownCompression,
}

impl CompressionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionFormat::GreggyBits => "GreggyBits",
            CompressionFormat::DonnBits => "DonnBits",
            CompressionFormat::UnknownCompression => "UnknownCompression",
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionFormat {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GreggyBits" => Ok(CompressionFormat::GreggyBits),
            "DonnBits" => Ok(CompressionFormat::DonnBits),
            "UnknownCompression" => Ok(CompressionFormat::UnknownCompression),
            _ => Err(ResourceError::InvalidArg(format!(
                "unknown compression format name '{}'",
                s
            ))),
        }
    }
}

/// The generic 12-byte part of the extended resource header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtHeader {
    pub signature: u32,
    pub header_len: u16,
    pub version: u8,
    pub attrs: u8,
    pub unpacked_len: u32,
}

impl ExtHeader {
    /// The header the GreggyBits encoder emits for `unpacked_len` bytes.
    pub fn for_gregg(unpacked_len: u32) -> Self {
        ExtHeader {
            signature: EXT_HEADER_SIGNATURE,
            header_len: EXT_HEADER_LEN,
            version: GREGG_VERSION,
            attrs: ATTR_COMPRESSED,
            unpacked_len,
        }
    }

    pub fn read(src: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(ExtHeader {
            signature: bytes::read_u32(src, "extended header signature")?,
            header_len: bytes::read_u16(src, "extended header length")?,
            version: bytes::read_u8(src, "extended header version")?,
            attrs: bytes::read_u8(src, "extended header attributes")?,
            unpacked_len: bytes::read_u32(src, "uncompressed length")?,
        })
    }

    pub fn write<W: Write>(&self, dst: &mut W) -> Result<()> {
        dst.write_u32::<BigEndian>(self.signature)?;
        dst.write_u16::<BigEndian>(self.header_len)?;
        dst.write_u8(self.version)?;
        dst.write_u8(self.attrs)?;
        dst.write_u32::<BigEndian>(self.unpacked_len)?;
        Ok(())
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.attrs & ATTR_COMPRESSED != 0
    }
}

/// GreggyBits sub-header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreggHeader {
    pub def_proc: u16,
    pub slop: u16,
    /// Dynamic table length minus one.
    pub tab_size: u8,
    pub flags: u8,
}

impl GreggHeader {
    pub const FLAG_DYNAMIC_TABLE: u8 = 0x01;
    pub const FLAG_BITMAPPED: u8 = 0x02;

    pub fn read(src: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(GreggHeader {
            def_proc: bytes::read_u16(src, "gregg defProc")?,
            slop: bytes::read_u16(src, "gregg slop")?,
            tab_size: bytes::read_u8(src, "gregg table size")?,
            flags: bytes::read_u8(src, "gregg flags")?,
        })
    }

    pub fn write<W: Write>(&self, dst: &mut W) -> Result<()> {
        dst.write_u16::<BigEndian>(self.def_proc)?;
        dst.write_u16::<BigEndian>(self.slop)?;
        dst.write_u8(self.tab_size)?;
        dst.write_u8(self.flags)?;
        Ok(())
    }

    #[inline]
    pub fn has_dynamic_table(&self) -> bool {
        self.flags & Self::FLAG_DYNAMIC_TABLE != 0
    }

    #[inline]
    pub fn is_bitmapped(&self) -> bool {
        self.flags & Self::FLAG_BITMAPPED != 0
    }
}

/// DonnBits sub-header. Parsed for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonnHeader {
    pub var_table_ratio: u8,
    pub overrun: u8,
    pub def_proc: u16,
    pub reserved: u16,
}

impl DonnHeader {
    pub fn read(src: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(DonnHeader {
            var_table_ratio: bytes::read_u8(src, "donn table ratio")?,
            overrun: bytes::read_u8(src, "donn overrun")?,
            def_proc: bytes::read_u16(src, "donn defProc")?,
            reserved: bytes::read_u16(src, "donn reserved")?,
        })
    }
}

/// Classifies a resource blob by its extended header.
///
/// Never fails: anything short, foreign or inconsistent is reported as
/// `UnknownCompression`.
pub fn classify(blob: &[u8]) -> CompressionFormat {
    if blob.len() < EXT_HEADER_LEN as usize {
        debug!("classify: {} bytes is too short for an extended header", blob.len());
        return CompressionFormat::UnknownCompression;
    }

    let mut src = Cursor::new(blob);
    let header = match ExtHeader::read(&mut src) {
        Ok(header) => header,
        Err(_) => return CompressionFormat::UnknownCompression,
    };

    if header.signature != EXT_HEADER_SIGNATURE {
        debug!("classify: invalid extended header signature 0x{:08X}", header.signature);
        return CompressionFormat::UnknownCompression;
    }
    if header.header_len != EXT_HEADER_LEN {
        debug!("classify: suspicious extended header length {}", header.header_len);
        return CompressionFormat::UnknownCompression;
    }
    if !header.is_compressed() {
        debug!("classify: extended attributes bit 0 clear, treating as uncompressed");
        return CompressionFormat::UnknownCompression;
    }

    match header.version {
        DONN_VERSION => {
            if let Ok(donn) = DonnHeader::read(&mut src) {
                debug!(
                    "classify: DonnBits, defProc {}, table ratio {}, overrun {}",
                    donn.def_proc, donn.var_table_ratio, donn.overrun
                );
            }
            CompressionFormat::DonnBits
        }
        GREGG_VERSION => {
            let def_proc = u16::from_be_bytes([blob[12], blob[13]]);
            if def_proc == GREGG_DEF_PROC {
                CompressionFormat::GreggyBits
            } else {
                debug!("classify: gregg header names unknown defProc {}", def_proc);
                CompressionFormat::UnknownCompression
            }
        }
        other => {
            debug!("classify: unknown extended header format {}", other);
            CompressionFormat::UnknownCompression
        }
    }
}
