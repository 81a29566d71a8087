// src/fork/mod.rs

//! Reading and writing resource forks.
//!
//! A fork is a 256-byte header, a data section of length-prefixed resource
//! bodies, and a resource map:
//!
//! ```text
//! header     data offset, map offset, data length, map length (u32 each)
//!            + 240 bytes free for the application
//! data       per resource: u32 length, bytes
//! map        24 reserved bytes, u16 type list offset, u16 name list offset
//! type list  u16 count-1, then per type: tag, u16 refs-1, u16 ref list offset
//! ref list   per resource: i16 id, u16 name offset, u32 attrs<<24 | data offset,
//!            u32 reserved
//! name list  Pascal strings
//! ```
//!
//! All integers are big-endian.

pub mod reader;
pub mod type_map;
pub mod writer;

pub use reader::{ForkHeader, ForkReader, ReadParams, parse, parse_all};
pub use type_map::TypeMap;
pub use writer::{ForkWriter, WriteParams, serialize};

/// Size of the fork header, including the free area.
pub const HEADER_SIZE: usize = 256;
/// Bytes of the header taken by the four offset/length fields.
pub const HEADER_FIELDS_SIZE: usize = 16;
/// Free header bytes available to the reserved-header pseudo-resource.
pub const FREE_HEADER_SIZE: usize = HEADER_SIZE - HEADER_FIELDS_SIZE;
/// Reserved bytes at the start of the map.
pub const MAP_RESERVED_SIZE: usize = 24;
/// Map header: 24 reserved bytes plus the two list offsets.
pub const MAP_HEADER_SIZE: usize = 28;
pub const TYPE_ENTRY_SIZE: usize = 8;
pub const REF_ENTRY_SIZE: usize = 12;
/// Name offset marking a resource without a name.
pub const NO_NAME: u16 = 0xFFFF;
/// Type count field value of a map with no types.
pub const NO_TYPES: u16 = 0xFFFF;
/// Largest data offset the 24-bit reference field can hold.
pub const MAX_DATA_OFFSET: usize = 0x00FF_FFFF;
