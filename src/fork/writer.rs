// src/fork/writer.rs

//! Writing resource forks.
//!
//! Resource bodies are appended to the data section as they are added. The
//! map goes after the data once every resource is known; the header fields
//! and the map's own offsets are patched in at the end.

use super::type_map::TypeMap;
use super::{
    FREE_HEADER_SIZE, HEADER_FIELDS_SIZE, HEADER_SIZE, MAP_HEADER_SIZE, MAP_RESERVED_SIZE,
    MAX_DATA_OFFSET, NO_NAME, REF_ENTRY_SIZE, TYPE_ENTRY_SIZE,
};
use crate::resource::Resource;
use crate::utils::error::{ResourceError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use encoding_rs::MACINTOSH;
use log::debug;
use std::borrow::BorrowMut;
use std::io::{Cursor, Seek, SeekFrom, Write};

/// Options for writing a fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteParams {
    /// Each resource's length prefix starts on a multiple of this many
    /// bytes from the start of the file.
    pub align: usize,
}

impl Default for WriteParams {
    fn default() -> Self {
        WriteParams { align: 1 }
    }
}

/// A resource whose body is already in the data section.
#[derive(Debug)]
struct PendingRef {
    id: i16,
    name: Option<Vec<u8>>,
    raw_attrs: u8,
    data_offset: usize,
}

/// Builds a resource fork in memory.
pub struct ForkWriter {
    out: Cursor<Vec<u8>>,
    params: WriteParams,
    types: TypeMap<PendingRef>,
}

impl ForkWriter {
    pub fn new(params: WriteParams) -> Result<Self> {
        if params.align == 0 {
            return Err(ResourceError::InvalidArg("alignment must be at least 1".to_string()));
        }
        let mut out = Cursor::new(vec![0u8; HEADER_SIZE]);
        out.set_position(HEADER_SIZE as u64);
        Ok(ForkWriter {
            out,
            params,
            types: TypeMap::new(),
        })
    }

    /// Appends a resource's body to the data section.
    ///
    /// Compressed resources are brought up to date with their payload first,
    /// which is why this needs `&mut`.
    pub fn add(&mut self, resource: &mut Resource) -> Result<()> {
        if resource.is_reserved_header() {
            return self.put_reserved_header(resource);
        }

        let res_type = resource.res_type;
        let id = resource.id;
        let name = resource.name.as_deref().map(encode_name).transpose()?;

        let (raw_attrs, body) = resource.to_disk()?;

        while self.out.position() as usize % self.params.align != 0 {
            self.out.write_u8(0)?;
        }

        let data_offset = self.out.position() as usize - HEADER_SIZE;
        if data_offset > MAX_DATA_OFFSET {
            return Err(ResourceError::OffsetOverflow {
                what: "resource data",
                value: data_offset,
            });
        }
        let body_len = u32::try_from(body.len()).map_err(|_| ResourceError::OffsetOverflow {
            what: "resource length",
            value: body.len(),
        })?;

        self.out.write_u32::<BigEndian>(body_len)?;
        self.out.write_all(body)?;

        self.types.push(
            res_type,
            PendingRef {
                id,
                name,
                raw_attrs,
                data_offset,
            },
        );
        Ok(())
    }

    fn put_reserved_header(&mut self, resource: &mut Resource) -> Result<()> {
        let payload = resource.data()?;
        if payload.len() > FREE_HEADER_SIZE {
            return Err(ResourceError::HeaderPayloadTooLong(payload.len()));
        }
        let start = HEADER_FIELDS_SIZE;
        self.out.get_mut()[start..start + payload.len()].copy_from_slice(payload);
        Ok(())
    }

    /// Writes the resource map, patches the header and returns the fork.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let map_offset = self.out.position() as usize;
        let type_count = self.types.type_count();
        let ref_count = self.types.item_count();

        // A count of 0xFFFF would read back as "no types".
        if type_count > u16::MAX as usize {
            return Err(ResourceError::TooManyEntries {
                what: "resource types",
                count: type_count,
            });
        }

        let type_list = map_offset + MAP_HEADER_SIZE;
        let ref_list = type_list + 2 + TYPE_ENTRY_SIZE * type_count;
        let name_list = ref_list + REF_ENTRY_SIZE * ref_count;

        self.out.write_all(&[0u8; MAP_HEADER_SIZE])?;

        // Type list. The count field of an empty map wraps to 0xFFFF.
        self.out.write_u16::<BigEndian>((type_count as u16).wrapping_sub(1))?;
        let mut refs_before = 0usize;
        for (res_type, refs) in self.types.iter() {
            if refs.len() > u16::MAX as usize + 1 {
                return Err(ResourceError::TooManyEntries {
                    what: "resources of one type",
                    count: refs.len(),
                });
            }
            let first_ref = ref_list + REF_ENTRY_SIZE * refs_before - type_list;
            self.out.write_all(res_type.as_bytes())?;
            self.out.write_u16::<BigEndian>((refs.len() - 1) as u16)?;
            self.out.write_u16::<BigEndian>(fit_u16(first_ref, "reference list")?)?;
            refs_before += refs.len();
        }

        // Reference list, with name offsets laid out in the same order.
        let mut next_name = 0usize;
        for pending in self.types.items() {
            let name_offset = match &pending.name {
                Some(name) => {
                    let offset = next_name;
                    next_name += 1 + name.len();
                    if offset >= NO_NAME as usize {
                        return Err(ResourceError::OffsetOverflow {
                            what: "resource name",
                            value: offset,
                        });
                    }
                    offset as u16
                }
                None => NO_NAME,
            };
            let mixed = ((pending.raw_attrs as u32) << 24) | pending.data_offset as u32;

            self.out.write_i16::<BigEndian>(pending.id)?;
            self.out.write_u16::<BigEndian>(name_offset)?;
            self.out.write_u32::<BigEndian>(mixed)?;
            self.out.write_u32::<BigEndian>(0)?;
        }

        // Name list.
        for name in self.types.items().filter_map(|pending| pending.name.as_ref()) {
            self.out.write_u8(name.len() as u8)?;
            self.out.write_all(name)?;
        }

        let end = self.out.position() as usize;

        // Patch the map's list offsets.
        self.out.seek(SeekFrom::Start((map_offset + MAP_RESERVED_SIZE) as u64))?;
        self.out.write_u16::<BigEndian>(fit_u16(type_list - map_offset, "type list")?)?;
        self.out.write_u16::<BigEndian>(fit_u16(name_list - map_offset, "name list")?)?;

        // Patch the fork header.
        self.out.seek(SeekFrom::Start(0))?;
        self.out.write_u32::<BigEndian>(HEADER_SIZE as u32)?;
        self.out.write_u32::<BigEndian>(fit_u32(map_offset, "resource map")?)?;
        self.out.write_u32::<BigEndian>(fit_u32(map_offset - HEADER_SIZE, "data section")?)?;
        self.out.write_u32::<BigEndian>(fit_u32(end - map_offset, "map length")?)?;

        debug!(
            "Fork: wrote {} types, {} resources, {} bytes",
            type_count, ref_count, end
        );

        Ok(self.out.into_inner())
    }
}

fn fit_u16(value: usize, what: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| ResourceError::OffsetOverflow { what, value })
}

fn fit_u32(value: usize, what: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| ResourceError::OffsetOverflow { what, value })
}

/// Encodes a resource name as a Mac Roman Pascal string body.
fn encode_name(name: &str) -> Result<Vec<u8>> {
    let (encoded, _, had_errors) = MACINTOSH.encode(name);
    if had_errors {
        return Err(ResourceError::NameEncoding(name.to_string()));
    }
    if encoded.len() > u8::MAX as usize {
        return Err(ResourceError::NameTooLong(encoded.len()));
    }
    Ok(encoded.into_owned())
}

/// Writes `resources` as a resource fork, in order.
///
/// Accepts owned resources or mutable references; compressed resources
/// update their cached blob as a side effect.
pub fn serialize<I, R>(resources: I, params: &WriteParams) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: BorrowMut<Resource>,
{
    let mut writer = ForkWriter::new(*params)?;
    for mut resource in resources {
        let resource: &mut Resource = resource.borrow_mut();
        writer.add(resource)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::CompressionFormat;
    use crate::fork::reader::{ReadParams, parse_all};
    use crate::resource::{ResType, ResourceAttrs};
    use byteorder::ReadBytesExt;

    fn be_u16(buf: &[u8], at: usize) -> u16 {
        Cursor::new(&buf[at..]).read_u16::<BigEndian>().unwrap()
    }

    fn be_u32(buf: &[u8], at: usize) -> u32 {
        Cursor::new(&buf[at..]).read_u32::<BigEndian>().unwrap()
    }

    #[test]
    fn test_single_resource_layout() {
        let res = Resource::new(*b"TEST", 128).with_data(b"hello".to_vec());
        let fork = serialize(vec![res], &WriteParams::default()).unwrap();

        // Header.
        assert_eq!(be_u32(&fork, 0), 256);
        assert_eq!(be_u32(&fork, 4), 256 + 4 + 5);
        assert_eq!(be_u32(&fork, 8), 9);
        assert_eq!(be_u32(&fork, 12), fork.len() as u32 - 265);
        assert!(fork[16..256].iter().all(|&b| b == 0));

        // Data.
        assert_eq!(be_u32(&fork, 256), 5);
        assert_eq!(&fork[260..265], b"hello");

        // Map: type list at +28, name list right after one ref.
        let map = 265;
        assert_eq!(be_u16(&fork, map + 24), 28);
        assert_eq!(be_u16(&fork, map + 26), 28 + 2 + 8 + 12);
        assert_eq!(be_u16(&fork, map + 28), 0);
        assert_eq!(&fork[map + 30..map + 34], b"TEST");
        assert_eq!(be_u16(&fork, map + 34), 0);
        assert_eq!(be_u16(&fork, map + 36), 10);

        // Reference: id 128, no name, attrs 0, offset 0.
        let reference = map + 28 + 10;
        assert_eq!(be_u16(&fork, reference), 128);
        assert_eq!(be_u16(&fork, reference + 2), NO_NAME);
        assert_eq!(be_u32(&fork, reference + 4), 0);
        assert_eq!(fork.len(), reference + 12);
    }

    #[test]
    fn test_empty_fork_has_no_types() {
        let fork = serialize(Vec::<Resource>::new(), &WriteParams::default()).unwrap();
        assert_eq!(fork.len(), 256 + 28 + 2);
        assert_eq!(be_u16(&fork, 256 + 28), 0xFFFF);
        assert!(parse_all(&fork, ReadParams::default()).unwrap().is_empty());
    }

    #[test]
    fn test_types_keep_first_seen_order() {
        let resources = vec![
            Resource::new(*b"ZZZZ", 2).with_data(vec![1]),
            Resource::new(*b"AAAA", 1).with_data(vec![2]),
            Resource::new(*b"ZZZZ", 1).with_data(vec![3]),
        ];
        let fork = serialize(resources, &WriteParams::default()).unwrap();
        let mut parsed = parse_all(&fork, ReadParams::default()).unwrap();

        let keys: Vec<(ResType, i16)> = parsed.iter().map(|r| (r.res_type, r.id)).collect();
        assert_eq!(
            keys,
            vec![
                (ResType(*b"ZZZZ"), 2),
                (ResType(*b"ZZZZ"), 1),
                (ResType(*b"AAAA"), 1),
            ]
        );
        assert_eq!(parsed[1].data().unwrap(), &[3]);
    }

    #[test]
    fn test_alignment_pads_data() {
        let resources = vec![
            Resource::new(*b"DATA", 1).with_data(vec![0xAA; 3]),
            Resource::new(*b"DATA", 2).with_data(vec![0xBB; 1]),
        ];
        let fork = serialize(resources, &WriteParams { align: 16 }).unwrap();
        // First body at 256, 7 bytes long; second padded to 272.
        assert_eq!(be_u32(&fork, 272), 1);
        assert_eq!(fork[276], 0xBB);

        let mut parsed = parse_all(&fork, ReadParams::default()).unwrap();
        assert_eq!(parsed[0].data().unwrap(), &[0xAA; 3]);
        assert_eq!(parsed[1].data().unwrap(), &[0xBB]);

        assert!(matches!(
            ForkWriter::new(WriteParams { align: 0 }),
            Err(ResourceError::InvalidArg(_))
        ));
    }

    #[test]
    fn test_compressed_bit_written_from_format() {
        let res = Resource::new(*b"CODE", 1)
            .with_attrs(ResourceAttrs::PURGEABLE)
            .with_data(vec![0x4E, 0x75, 0x4E, 0x75])
            .with_compression(CompressionFormat::GreggyBits);
        let fork = serialize(vec![res], &WriteParams::default()).unwrap();

        let map = be_u32(&fork, 4) as usize;
        let reference = map + 28 + 10;
        assert_eq!(fork[reference + 4], 0x21);

        let mut parsed = parse_all(&fork, ReadParams::default()).unwrap();
        assert_eq!(parsed[0].attrs, ResourceAttrs::PURGEABLE);
        assert_eq!(parsed[0].compression(), Some(CompressionFormat::GreggyBits));
        assert_eq!(parsed[0].data().unwrap(), &[0x4E, 0x75, 0x4E, 0x75]);
    }

    #[test]
    fn test_names_are_mac_roman() {
        let resources = vec![
            Resource::new(*b"STR ", 1).with_name("Caf\u{e9}"),
            Resource::new(*b"STR ", 2),
            Resource::new(*b"STR ", 3).with_name("second"),
        ];
        let fork = serialize(resources, &WriteParams::default()).unwrap();
        assert!(fork.windows(5).any(|w| w == b"\x04Caf\x8E"));

        let parsed = parse_all(&fork, ReadParams::default()).unwrap();
        assert_eq!(parsed[0].name.as_deref(), Some("Caf\u{e9}"));
        assert_eq!(parsed[1].name, None);
        assert_eq!(parsed[2].name.as_deref(), Some("second"));
    }

    #[test]
    fn test_bad_names_rejected() {
        let long = Resource::new(*b"STR ", 1).with_name("x".repeat(256));
        assert!(matches!(
            serialize(vec![long], &WriteParams::default()),
            Err(ResourceError::NameTooLong(256))
        ));

        let unmappable = Resource::new(*b"STR ", 1).with_name("\u{4E2D}");
        assert!(matches!(
            serialize(vec![unmappable], &WriteParams::default()),
            Err(ResourceError::NameEncoding(_))
        ));
    }

    #[test]
    fn test_reserved_header_area() {
        let resources = vec![
            Resource::reserved_header(b"creator".to_vec()),
            Resource::new(*b"TEXT", 1).with_data(b"x".to_vec()),
        ];
        let fork = serialize(resources, &WriteParams::default()).unwrap();
        assert_eq!(&fork[16..23], b"creator");

        let params = ReadParams { header_pseudo_resource: true, ..Default::default() };
        let mut parsed = parse_all(&fork, params).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_reserved_header());
        assert_eq!(&parsed[0].data().unwrap()[..7], b"creator");
        assert_eq!(parsed[0].data().unwrap().len(), 240);

        // Writing the pseudo-resource back reproduces the same fork.
        assert_eq!(serialize(parsed, &WriteParams::default()).unwrap(), fork);

        let too_long = Resource::reserved_header(vec![1u8; 241]);
        assert!(matches!(
            serialize(vec![too_long], &WriteParams::default()),
            Err(ResourceError::HeaderPayloadTooLong(241))
        ));
    }

    #[test]
    fn test_serialize_by_reference_keeps_resources() {
        let mut resources = vec![
            Resource::new(*b"snd ", 1)
                .with_data(vec![7u8; 40])
                .with_compression(CompressionFormat::GreggyBits),
        ];
        let first = serialize(resources.iter_mut(), &WriteParams::default()).unwrap();
        let second = serialize(resources.iter_mut(), &WriteParams::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(resources[0].data().unwrap(), &[7u8; 40]);
    }

    fn many_of_one_type(count: usize) -> Vec<Resource> {
        (0..count)
            .map(|i| Resource::new(*b"MANY", i as i16))
            .collect()
    }

    fn one_each_of_many_types(count: usize) -> Vec<Resource> {
        (0..count as u32)
            .map(|i| Resource::new(i.to_be_bytes(), 0))
            .collect()
    }

    #[test]
    fn test_data_offset_limited_to_24_bits() {
        let mut writer = ForkWriter::new(WriteParams::default()).unwrap();

        // The second body lands exactly on the last representable offset.
        let mut big = Resource::new(*b"DATA", 1).with_data(vec![0u8; MAX_DATA_OFFSET - 4]);
        writer.add(&mut big).unwrap();
        writer.add(&mut Resource::new(*b"DATA", 2)).unwrap();

        let err = writer.add(&mut Resource::new(*b"DATA", 3)).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::OffsetOverflow { what: "resource data", value } if value == MAX_DATA_OFFSET + 4
        ));
    }

    #[test]
    fn test_name_offsets_limited_to_16_bits() {
        let named = |count: usize| -> Vec<Resource> {
            (0..count)
                .map(|i| Resource::new(*b"STR ", i as i16).with_name("n".repeat(255)))
                .collect()
        };

        // 256 names of 256 bytes each end exactly at 0x10000.
        let fork = serialize(named(256), &WriteParams::default()).unwrap();
        let parsed = parse_all(&fork, ReadParams::default()).unwrap();
        assert_eq!(parsed[255].name.as_deref(), Some("n".repeat(255).as_str()));

        let err = serialize(named(257), &WriteParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::OffsetOverflow { what: "resource name", value: 65536 }
        ));
    }

    #[test]
    fn test_too_many_types() {
        let err = serialize(one_each_of_many_types(65536), &WriteParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::TooManyEntries { what: "resource types", count: 65536 }
        ));
    }

    #[test]
    fn test_too_many_resources_of_one_type() {
        let err = serialize(many_of_one_type(65537), &WriteParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::TooManyEntries { what: "resources of one type", count: 65537 }
        ));
    }

    #[test]
    fn test_reference_list_offset_limited_to_16_bits() {
        // With 5000 type entries, type 2128's references start at
        // 2 + 8 * 5000 + 12 * 2128 = 65538 from the type list.
        let err = serialize(one_each_of_many_types(5000), &WriteParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::OffsetOverflow { what: "reference list", value: 65538 }
        ));
    }

    #[test]
    fn test_name_list_offset_limited_to_16_bits() {
        // 28 + 2 + 8 + 12 * 6000 = 72038 from the map start.
        let err = serialize(many_of_one_type(6000), &WriteParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::OffsetOverflow { what: "name list", value: 72038 }
        ));

        // 5458 references still fit: 28 + 2 + 8 + 12 * 5458 = 65534.
        let fork = serialize(many_of_one_type(5458), &WriteParams::default()).unwrap();
        assert_eq!(parse_all(&fork, ReadParams::default()).unwrap().len(), 5458);
    }
}
