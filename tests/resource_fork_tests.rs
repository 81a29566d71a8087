use byteorder::{BigEndian, ReadBytesExt};
use macrsrc::{
    CacheState, CompressionFormat, ReadParams, ResType, Resource, ResourceAttrs, ResourceError,
    WriteParams, classify, parse, parse_all, serialize,
};
use std::io::{Cursor, Read};

/// A GreggyBits blob of two bytes: built-in table index 2, no dynamic table,
/// no bitmap.
const BUILTIN_INDEX_BLOB: [u8; 19] = [
    0xA8, 0x9F, 0x65, 0x72, 0x00, 0x12, 0x09, 0x01, 0x00, 0x00, 0x00, 0x02, // extended header
    0x00, 0x02, 0x00, 0x00, 0x00, 0x00, // gregg header
    0x02,
];

fn sample_resources() -> Vec<Resource> {
    vec![
        Resource::new(*b"STR#", 128)
            .with_name("Messages")
            .with_data(b"\x00\x02\x05Hello\x05World".to_vec()),
        Resource::new(*b"CODE", 0)
            .with_attrs(ResourceAttrs::PURGEABLE | ResourceAttrs::LOCKED)
            .with_data((0u16..512).flat_map(|w| (w % 7).to_be_bytes()).collect::<Vec<u8>>())
            .with_compression(CompressionFormat::GreggyBits),
        Resource::new(*b"STR#", 129).with_data(Vec::new()),
        Resource::new(*b"vers", 1)
            .with_attrs(ResourceAttrs::PROTECTED)
            .with_data(vec![0x01, 0x00, 0x80, 0x00, 0x00, 0x00]),
    ]
}

/// Test: parsing nothing yields nothing
#[test]
fn test_empty_input() {
    let mut reader = parse(b"", ReadParams::default()).expect("empty input is a valid fork");
    assert!(reader.next().is_none());
    assert!(parse_all(b"", ReadParams::default()).unwrap().is_empty());
}

/// Test: one plain record survives a write and read
#[test]
fn test_single_record_round_trip() {
    let original = Resource::new(*b"TEST", 128).with_data(b"hello".to_vec());
    let fork = serialize(vec![original], &WriteParams::default()).unwrap();

    let mut parsed = parse_all(&fork, ReadParams::default()).unwrap();
    assert_eq!(parsed.len(), 1);
    let res = &mut parsed[0];
    assert_eq!(res.res_type, ResType::new(*b"TEST"));
    assert_eq!(res.id, 128);
    assert_eq!(res.name, None);
    assert_eq!(res.attrs.bits(), 0);
    assert_eq!(res.data().unwrap(), b"hello");
}

/// Test: a fork-resident GreggyBits blob expands through the built-in table
#[test]
fn test_builtin_table_resource() {
    let stored = Resource::from_disk(*b"CODE", 1, None, 0x01, BUILTIN_INDEX_BLOB.to_vec());
    let fork = serialize(vec![stored], &WriteParams::default()).unwrap();

    let mut parsed = parse_all(&fork, ReadParams::default()).unwrap();
    let res = &mut parsed[0];
    assert_eq!(res.compression(), Some(CompressionFormat::GreggyBits));
    assert_eq!(res.cache_state(), CacheState::CompressedOnly);
    assert_eq!(res.data().unwrap(), &[0x4E, 0xBA]);
    assert_eq!(res.cache_state(), CacheState::Clean);
}

/// Test: wrong magic is reported as unknown, not an error
#[test]
fn test_wrong_magic_is_unknown() {
    let mut blob = BUILTIN_INDEX_BLOB;
    blob[0] = 0xA9;
    assert_eq!(classify(&blob), CompressionFormat::UnknownCompression);
    assert_eq!(classify(b"tiny"), CompressionFormat::UnknownCompression);
}

/// Test: unknown compressed data needs an explicit opt-in to read
#[test]
fn test_unknown_compression_opt_in() {
    let stored = Resource::from_disk(*b"snd ", 5, None, 0x01, b"not a real header at all".to_vec());
    let fork = serialize(vec![stored], &WriteParams::default()).unwrap();

    let mut strict = parse_all(&fork, ReadParams::default()).unwrap();
    assert!(matches!(strict[0].data(), Err(ResourceError::UnknownCompression)));

    let params = ReadParams {
        expand_unknown: true,
        ..Default::default()
    };
    let mut lenient = parse_all(&fork, params).unwrap();
    assert_eq!(lenient[0].data().unwrap(), b"not a real header at all");
}

/// Test: a mixed fork writes back byte for byte
#[test]
fn test_container_round_trip() {
    let fork = serialize(sample_resources(), &WriteParams::default()).unwrap();

    let mut parsed = parse_all(&fork, ReadParams::default()).unwrap();
    let mut expected = sample_resources();
    assert_eq!(parsed.len(), expected.len());

    // Parsing groups by type: STR# 128, STR# 129, CODE 0, vers 1.
    let order = [0usize, 2, 1, 3];
    for (res, &i) in parsed.iter_mut().zip(order.iter()) {
        let want = &mut expected[i];
        assert_eq!(res.res_type, want.res_type);
        assert_eq!(res.id, want.id);
        assert_eq!(res.name, want.name);
        assert_eq!(res.attrs, want.attrs);
        assert_eq!(res.compression(), want.compression());
        assert_eq!(res.data().unwrap(), want.data().unwrap());
    }

    // Reading every payload must not change what gets written.
    let rewritten = serialize(parsed.iter_mut(), &WriteParams::default()).unwrap();
    let again = serialize(
        parse_all(&rewritten, ReadParams::default()).unwrap(),
        &WriteParams::default(),
    )
    .unwrap();
    assert_eq!(rewritten, again);
}

/// Test: editing a compressed payload recompresses it on write
#[test]
fn test_edit_compressed_payload() {
    let fork = serialize(sample_resources(), &WriteParams::default()).unwrap();
    let mut parsed = parse_all(&fork, ReadParams::default()).unwrap();

    let code = parsed
        .iter_mut()
        .find(|r| r.res_type == ResType::new(*b"CODE"))
        .unwrap();
    code.data_mut().unwrap().extend_from_slice(&[0x4E, 0x75]);
    assert_eq!(code.cache_state(), CacheState::Dirty);

    let fork = serialize(parsed, &WriteParams::default()).unwrap();
    let mut reparsed = parse_all(&fork, ReadParams::default()).unwrap();
    let code = reparsed
        .iter_mut()
        .find(|r| r.res_type == ResType::new(*b"CODE"))
        .unwrap();
    let data = code.data().unwrap();
    assert_eq!(data.len(), 1026);
    assert_eq!(&data[1024..], &[0x4E, 0x75]);
}

/// Test: resource fork structure validator
#[test]
fn test_fork_structure_validator() {
    let fork = serialize(sample_resources(), &WriteParams { align: 4 }).unwrap();
    let mut cursor = Cursor::new(&fork);

    // 1) Header fields
    let data_offset = cursor.read_u32::<BigEndian>().unwrap() as usize;
    let map_offset = cursor.read_u32::<BigEndian>().unwrap() as usize;
    let data_len = cursor.read_u32::<BigEndian>().unwrap() as usize;
    let map_len = cursor.read_u32::<BigEndian>().unwrap() as usize;
    assert_eq!(data_offset, 256);
    assert_eq!(data_offset + data_len, map_offset);
    assert_eq!(map_offset + map_len, fork.len(), "map runs to the end of the fork");

    // 2) Map header
    cursor.set_position((map_offset + 24) as u64);
    let type_list = map_offset + cursor.read_u16::<BigEndian>().unwrap() as usize;
    let name_list = map_offset + cursor.read_u16::<BigEndian>().unwrap() as usize;
    assert_eq!(type_list, map_offset + 28);

    // 3) Types, then every reference of each type
    cursor.set_position(type_list as u64);
    let type_count = cursor.read_u16::<BigEndian>().unwrap() as usize + 1;
    assert_eq!(type_count, 3);

    let mut seen = 0;
    for t in 0..type_count {
        cursor.set_position((type_list + 2 + 8 * t) as u64);
        let mut tag = [0u8; 4];
        cursor.read_exact(&mut tag).unwrap();
        let refs = cursor.read_u16::<BigEndian>().unwrap() as usize + 1;
        let ref_list = type_list + cursor.read_u16::<BigEndian>().unwrap() as usize;

        for r in 0..refs {
            cursor.set_position((ref_list + 12 * r) as u64);
            let _id = cursor.read_i16::<BigEndian>().unwrap();
            let name_offset = cursor.read_u16::<BigEndian>().unwrap();
            let mixed = cursor.read_u32::<BigEndian>().unwrap();
            assert_eq!(cursor.read_u32::<BigEndian>().unwrap(), 0);

            let body = data_offset + (mixed & 0x00FF_FFFF) as usize;
            assert_eq!(body % 4, 0, "bodies are aligned");
            let len = u32::from_be_bytes(fork[body..body + 4].try_into().unwrap()) as usize;
            assert!(body + 4 + len <= map_offset);

            if name_offset != 0xFFFF {
                let at = name_list + name_offset as usize;
                assert!(at + 1 + fork[at] as usize <= fork.len());
            }
            seen += 1;
        }
    }
    assert_eq!(seen, 4);
}

/// Test: forks written to disk read back
#[test]
fn test_on_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.rsrc");

    let fork = serialize(sample_resources(), &WriteParams::default()).unwrap();
    std::fs::write(&path, &fork).unwrap();

    let loaded = std::fs::read(&path).unwrap();
    let mut parsed = parse_all(&loaded, ReadParams::default()).unwrap();
    let strings = parsed
        .iter_mut()
        .find(|r| r.name.as_deref() == Some("Messages"))
        .unwrap();
    assert_eq!(strings.data().unwrap(), b"\x00\x02\x05Hello\x05World");
}

/// Test: damaged forks fail instead of panicking
#[test]
fn test_truncated_forks() {
    let fork = serialize(sample_resources(), &WriteParams::default()).unwrap();
    for cut in [1, 17, 255, 300, fork.len() - 1] {
        let result = parse(&fork[..cut], ReadParams::default())
            .and_then(|reader| reader.collect::<macrsrc::Result<Vec<_>>>());
        assert!(result.is_err(), "fork cut to {} bytes parsed", cut);
    }
}
