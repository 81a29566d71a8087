// src/resource/record.rs

//! A single resource: type, id, optional name, attributes and data.
//!
//! Resources read from a fork with the compressed attribute keep their
//! on-disk blob and only expand it the first time the data is asked for.
//! Once expanded, the original blob stays around as a cache tagged with a
//! BLAKE3 fingerprint of the expanded payload. Writing the resource back
//! reuses the cache for as long as the payload still hashes the same, so an
//! untouched resource is never recompressed.

use super::attrs::ResourceAttrs;
use crate::compress::{self, CompressionFormat};
use crate::utils::error::{ResourceError, Result};
use log::debug;
use std::fmt;

/// A four-byte resource type code, such as `CODE` or `STR#`.
///
/// The bytes are opaque; they are not required to be text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResType(pub [u8; 4]);

impl ResType {
    #[inline]
    pub const fn new(code: [u8; 4]) -> Self {
        ResType(code)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for ResType {
    fn from(code: [u8; 4]) -> Self {
        ResType(code)
    }
}

impl From<&[u8; 4]> for ResType {
    fn from(code: &[u8; 4]) -> Self {
        ResType(*code)
    }
}

impl TryFrom<&[u8]> for ResType {
    type Error = ResourceError;

    fn try_from(code: &[u8]) -> Result<Self> {
        let code: [u8; 4] = code.try_into().map_err(|_| {
            ResourceError::InvalidArg(format!("resource type must be 4 bytes, got {}", code.len()))
        })?;
        Ok(ResType(code))
    }
}

impl fmt::Display for ResType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for ResType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0.escape_ascii())
    }
}

/// Where a compressed resource's payload currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// Only the on-disk blob exists; nothing has been expanded yet.
    CompressedOnly,
    /// The payload is expanded and can be written as is: either it is stored
    /// uncompressed or the cached blob still matches it.
    Clean,
    /// The payload is expanded and differs from (or has no) cached blob.
    Dirty,
}

#[derive(Clone)]
struct CompressedCache {
    blob: Vec<u8>,
    fingerprint: blake3::Hash,
    format: CompressionFormat,
}

#[derive(Clone)]
enum Payload {
    CompressedOnly { blob: Vec<u8> },
    Realized { data: Vec<u8>, cache: Option<CompressedCache> },
}

const RESERVED_HEADER_TYPE: ResType = ResType(*b"\0hdr");
const RESERVED_HEADER_NAME: &str = "Header as fake resource (not for Rez)";

/// A Macintosh resource.
#[derive(Clone)]
pub struct Resource {
    pub res_type: ResType,
    pub id: i16,
    pub name: Option<String>,
    /// User-visible flags; never includes the on-disk compressed bit.
    pub attrs: ResourceAttrs,
    compression: Option<CompressionFormat>,
    payload: Payload,
    expand_unknown: bool,
    reserved_header: bool,
}

impl Resource {
    /// Creates an uncompressed resource with no name, no flags and no data.
    pub fn new(res_type: impl Into<ResType>, id: i16) -> Self {
        Resource {
            res_type: res_type.into(),
            id,
            name: None,
            attrs: ResourceAttrs::empty(),
            compression: None,
            payload: Payload::Realized {
                data: Vec::new(),
                cache: None,
            },
            expand_unknown: false,
            reserved_header: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attrs(mut self, attrs: ResourceAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.set_data(data.into());
        self
    }

    /// Marks a newly built resource to be stored compressed in `format`.
    ///
    /// Has no effect on a resource still holding its on-disk blob; use
    /// [`set_compression`](Self::set_compression) there.
    pub fn with_compression(mut self, format: CompressionFormat) -> Self {
        if self.is_realized() {
            self.compression = Some(format);
        }
        self
    }

    /// Builds a resource from its on-disk pieces.
    ///
    /// With the compressed bit set in `raw_attrs`, the blob is classified and
    /// kept as-is until the data is first read.
    pub fn from_disk(
        res_type: impl Into<ResType>,
        id: i16,
        name: Option<String>,
        raw_attrs: u8,
        blob: Vec<u8>,
    ) -> Self {
        let res_type = res_type.into();
        let (attrs, compressed) = ResourceAttrs::split_disk(raw_attrs);
        let (compression, payload) = if compressed {
            let format = compress::classify(&blob);
            debug!("Resource {} {}: {} bytes, {}", res_type, id, blob.len(), format);
            (Some(format), Payload::CompressedOnly { blob })
        } else {
            (
                None,
                Payload::Realized {
                    data: blob,
                    cache: None,
                },
            )
        };

        Resource {
            res_type,
            id,
            name,
            attrs,
            compression,
            payload,
            expand_unknown: false,
            reserved_header: false,
        }
    }

    /// The pseudo-resource that carries bytes 16..256 of a fork's header.
    pub fn reserved_header(data: impl Into<Vec<u8>>) -> Self {
        let mut resource = Resource::new(RESERVED_HEADER_TYPE, 0).with_name(RESERVED_HEADER_NAME);
        resource.set_data(data.into());
        resource.reserved_header = true;
        resource
    }

    #[inline]
    pub fn is_reserved_header(&self) -> bool {
        self.reserved_header
    }

    #[inline]
    pub fn compression(&self) -> Option<CompressionFormat> {
        self.compression
    }

    /// Changes how the resource is stored on disk.
    ///
    /// The current data is expanded first, so this fails where reading the
    /// data would.
    pub fn set_compression(&mut self, format: Option<CompressionFormat>) -> Result<()> {
        if format == self.compression {
            return Ok(());
        }
        self.ensure_realized()?;
        self.compression = format;
        Ok(())
    }

    #[inline]
    pub fn expand_unknown(&self) -> bool {
        self.expand_unknown
    }

    /// Allows reading data stored in an unrecognised compression format,
    /// which is then handed back exactly as stored.
    pub fn set_expand_unknown(&mut self, allow: bool) {
        self.expand_unknown = allow;
    }

    #[inline]
    pub fn is_realized(&self) -> bool {
        matches!(self.payload, Payload::Realized { .. })
    }

    /// The uncompressed data, expanding it on first access.
    pub fn data(&mut self) -> Result<&[u8]> {
        Ok(self.realized_mut()?.as_slice())
    }

    /// Mutable access to the uncompressed data.
    pub fn data_mut(&mut self) -> Result<&mut Vec<u8>> {
        self.realized_mut()
    }

    /// Replaces the data. The compressed cache goes stale unless the new
    /// bytes happen to be identical.
    pub fn set_data(&mut self, data: Vec<u8>) {
        match &mut self.payload {
            Payload::Realized { data: current, .. } => *current = data,
            Payload::CompressedOnly { .. } => {
                self.payload = Payload::Realized { data, cache: None };
            }
        }
    }

    pub fn into_data(mut self) -> Result<Vec<u8>> {
        self.ensure_realized()?;
        match self.payload {
            Payload::Realized { data, .. } => Ok(data),
            Payload::CompressedOnly { blob } => Ok(blob),
        }
    }

    pub fn cache_state(&self) -> CacheState {
        match &self.payload {
            Payload::CompressedOnly { .. } => CacheState::CompressedOnly,
            Payload::Realized { .. } if self.compression.is_none() => CacheState::Clean,
            Payload::Realized { data, cache } => match (cache, self.compression) {
                (Some(cache), Some(format))
                    if cache.format == format && cache.fingerprint == blake3::hash(data) =>
                {
                    CacheState::Clean
                }
                _ => CacheState::Dirty,
            },
        }
    }

    /// Expands the stored blob if that has not happened yet.
    pub fn ensure_realized(&mut self) -> Result<()> {
        let blob = match &mut self.payload {
            Payload::Realized { .. } => return Ok(()),
            Payload::CompressedOnly { blob } => blob,
        };

        let format = self.compression.unwrap_or(CompressionFormat::UnknownCompression);
        let data = match format {
            CompressionFormat::GreggyBits => compress::decompress(blob)?,
            CompressionFormat::DonnBits => {
                return Err(ResourceError::Unimplemented("DonnBits decompression"));
            }
            CompressionFormat::UnknownCompression => {
                if !self.expand_unknown {
                    return Err(ResourceError::UnknownCompression);
                }
                blob.clone()
            }
        };

        debug!(
            "Resource {} {}: expanded {} bytes to {}",
            self.res_type,
            self.id,
            blob.len(),
            data.len()
        );

        let cache = CompressedCache {
            blob: std::mem::take(blob),
            fingerprint: blake3::hash(&data),
            format,
        };
        self.payload = Payload::Realized {
            data,
            cache: Some(cache),
        };
        Ok(())
    }

    /// Brings the compressed cache up to date with the payload, recompressing
    /// only when the payload's fingerprint or the format changed.
    pub fn ensure_compressed(&mut self) -> Result<()> {
        let Some(format) = self.compression else {
            return Ok(());
        };
        let Payload::Realized { data, cache } = &mut self.payload else {
            return Ok(());
        };

        let fingerprint = blake3::hash(data);
        let fresh = matches!(cache, Some(c) if c.format == format && c.fingerprint == fingerprint);
        if !fresh {
            debug!(
                "Resource {} {}: compressing {} bytes as {}",
                self.res_type,
                self.id,
                data.len(),
                format
            );
            let blob = compress::compress(data, format)?;
            *cache = Some(CompressedCache {
                blob,
                fingerprint,
                format,
            });
        }
        Ok(())
    }

    /// The attribute byte and data exactly as they go on disk.
    pub fn to_disk(&mut self) -> Result<(u8, &[u8])> {
        self.ensure_compressed()?;

        let raw_attrs = self.attrs.to_disk(self.compression.is_some());
        let bytes = match (&self.payload, self.compression) {
            (Payload::CompressedOnly { blob }, _) => blob.as_slice(),
            (Payload::Realized { cache: Some(cache), .. }, Some(_)) => cache.blob.as_slice(),
            (Payload::Realized { data, .. }, _) => data.as_slice(),
        };
        Ok((raw_attrs, bytes))
    }

    fn realized_mut(&mut self) -> Result<&mut Vec<u8>> {
        self.ensure_realized()?;
        match &mut self.payload {
            Payload::Realized { data, .. } => Ok(data),
            Payload::CompressedOnly { blob } => Ok(blob),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview = match &self.payload {
            Payload::Realized { data, .. } => {
                let head = &data[..data.len().min(4)];
                if data.len() > head.len() {
                    format!("b\"{}\"...{}b", head.escape_ascii(), data.len())
                } else {
                    format!("b\"{}\"", head.escape_ascii())
                }
            }
            Payload::CompressedOnly { blob } => format!("<{} bytes compressed>", blob.len()),
        };

        f.debug_struct("Resource")
            .field("type", &self.res_type)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .field("compression", &self.compression)
            .field("data", &format_args!("{}", preview))
            .finish()
    }
}
