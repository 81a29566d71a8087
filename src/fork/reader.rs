// src/fork/reader.rs

//! Parsing resource forks.
//!
//! `ForkReader` reads the header and type list up front, then yields one
//! `Resource` per reference, type by type, in file order. Compressed
//! resources come out with their blob still packed; see
//! [`Resource`](crate::resource::Resource).

use super::{
    FREE_HEADER_SIZE, HEADER_FIELDS_SIZE, MAP_RESERVED_SIZE, MAX_DATA_OFFSET, NO_NAME, NO_TYPES,
    REF_ENTRY_SIZE, TYPE_ENTRY_SIZE,
};
use crate::resource::{ResType, Resource};
use crate::utils::bytes;
use crate::utils::error::Result;
use encoding_rs::MACINTOSH;
use log::{debug, warn};
use std::io::Cursor;

/// Options for reading a fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadParams {
    /// Yield the free header area (bytes 16..256) as a leading
    /// reserved-header pseudo-resource when it is not all zero.
    pub header_pseudo_resource: bool,
    /// Let resources in an unrecognised compression format hand back their
    /// stored bytes instead of failing on read.
    pub expand_unknown: bool,
}

/// The four fields at the start of every fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkHeader {
    pub data_offset: u32,
    pub map_offset: u32,
    pub data_len: u32,
    pub map_len: u32,
}

impl ForkHeader {
    pub fn read(src: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(ForkHeader {
            data_offset: bytes::read_u32(src, "fork data offset")?,
            map_offset: bytes::read_u32(src, "fork map offset")?,
            data_len: bytes::read_u32(src, "fork data length")?,
            map_len: bytes::read_u32(src, "fork map length")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    res_type: ResType,
    count: usize,
    ref_list: usize,
}

/// An iterator over the resources of an in-memory fork.
pub struct ForkReader<'a> {
    src: Cursor<&'a [u8]>,
    params: ReadParams,
    header: Option<ForkHeader>,
    data_offset: usize,
    pending_header: Option<Resource>,
    types: Vec<TypeEntry>,
    name_list: usize,
    type_idx: usize,
    ref_idx: usize,
    failed: bool,
}

impl<'a> ForkReader<'a> {
    /// Reads the fork header, map header and type list.
    ///
    /// An empty buffer is a valid, empty fork.
    pub fn new(data: &'a [u8], params: ReadParams) -> Result<Self> {
        let mut reader = ForkReader {
            src: Cursor::new(data),
            params,
            header: None,
            data_offset: 0,
            pending_header: None,
            types: Vec::new(),
            name_list: 0,
            type_idx: 0,
            ref_idx: 0,
            failed: false,
        };

        if data.is_empty() {
            return Ok(reader);
        }

        if params.header_pseudo_resource {
            let end = data.len().min(HEADER_FIELDS_SIZE + FREE_HEADER_SIZE);
            let free = data.get(HEADER_FIELDS_SIZE..end).unwrap_or(&[]);
            if free.iter().any(|&b| b != 0) {
                reader.pending_header = Some(Resource::reserved_header(free.to_vec()));
            }
        }

        let header = ForkHeader::read(&mut reader.src)?;
        reader.header = Some(header);
        reader.data_offset = header.data_offset as usize;

        let map = header.map_offset as usize;
        bytes::seek_to(&mut reader.src, map + MAP_RESERVED_SIZE, "map header")?;
        let type_list = map + bytes::read_u16(&mut reader.src, "type list offset")? as usize;
        reader.name_list = map + bytes::read_u16(&mut reader.src, "name list offset")? as usize;

        bytes::seek_to(&mut reader.src, type_list, "type list")?;
        let raw_count = bytes::read_u16(&mut reader.src, "type count")?;
        if raw_count == NO_TYPES {
            debug!("Fork: map holds no types");
            return Ok(reader);
        }

        let type_count = raw_count as usize + 1;
        for i in 0..type_count {
            bytes::seek_to(&mut reader.src, type_list + 2 + TYPE_ENTRY_SIZE * i, "type entry")?;
            let tag = bytes::take(&mut reader.src, 4, "type code")?;
            let res_type = ResType::try_from(tag)?;
            let count = bytes::read_u16(&mut reader.src, "resource count")? as usize + 1;
            let ref_list = type_list + bytes::read_u16(&mut reader.src, "reference list offset")? as usize;
            reader.types.push(TypeEntry {
                res_type,
                count,
                ref_list,
            });
        }

        debug!(
            "Fork: {} bytes, {} types, {} resources",
            data.len(),
            reader.types.len(),
            reader.types.iter().map(|t| t.count).sum::<usize>()
        );

        Ok(reader)
    }

    /// The fork header, absent for an empty fork.
    #[inline]
    pub fn header(&self) -> Option<&ForkHeader> {
        self.header.as_ref()
    }

    fn read_resource(&mut self, entry: TypeEntry, index: usize) -> Result<Resource> {
        bytes::seek_to(&mut self.src, entry.ref_list + REF_ENTRY_SIZE * index, "reference entry")?;
        let id = bytes::read_i16(&mut self.src, "resource id")?;
        let name_offset = bytes::read_u16(&mut self.src, "name offset")?;
        let mixed = bytes::read_u32(&mut self.src, "attributes and data offset")?;

        let raw_attrs = (mixed >> 24) as u8;
        if raw_attrs & 0x02 != 0 {
            warn!(
                "Resource {} {}: 'changed' attribute set on disk, ignoring it",
                entry.res_type, id
            );
        }

        let data_at = self.data_offset.saturating_add((mixed as usize) & MAX_DATA_OFFSET);
        bytes::seek_to(&mut self.src, data_at, "resource data")?;
        let len = bytes::read_u32(&mut self.src, "resource length")? as usize;
        let blob = bytes::take(&mut self.src, len, "resource data")?.to_vec();

        let name = if name_offset == NO_NAME {
            None
        } else {
            bytes::seek_to(&mut self.src, self.name_list + name_offset as usize, "resource name")?;
            let name_len = bytes::read_u8(&mut self.src, "name length")? as usize;
            let raw = bytes::take(&mut self.src, name_len, "resource name")?;
            let (decoded, _) = MACINTOSH.decode_without_bom_handling(raw);
            Some(decoded.into_owned())
        };

        let mut resource = Resource::from_disk(entry.res_type, id, name, raw_attrs, blob);
        resource.set_expand_unknown(self.params.expand_unknown);
        Ok(resource)
    }
}

impl Iterator for ForkReader<'_> {
    type Item = Result<Resource>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pseudo) = self.pending_header.take() {
            return Some(Ok(pseudo));
        }
        if self.failed {
            return None;
        }

        while let Some(&entry) = self.types.get(self.type_idx) {
            if self.ref_idx < entry.count {
                let index = self.ref_idx;
                self.ref_idx += 1;
                let result = self.read_resource(entry, index);
                if result.is_err() {
                    self.failed = true;
                }
                return Some(result);
            }
            self.type_idx += 1;
            self.ref_idx = 0;
        }
        None
    }
}

/// Starts reading `data` as a resource fork.
pub fn parse(data: &[u8], params: ReadParams) -> Result<ForkReader<'_>> {
    ForkReader::new(data, params)
}

/// Reads every resource of `data`, failing on the first bad one.
pub fn parse_all(data: &[u8], params: ReadParams) -> Result<Vec<Resource>> {
    ForkReader::new(data, params)?.collect()
}
