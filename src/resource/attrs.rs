// src/resource/attrs.rs

//! The resource attributes byte.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Attribute flags of a resource.
///
/// Two bits of the on-disk byte are storage details and can never be set
/// through this type: 0x02 ("changed since load", meaningless on disk) and
/// 0x01 ("data is compressed", carried by the resource's compression format
/// instead).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceAttrs(u8);

impl ResourceAttrs {
    /// Reference to a system or local resource. Preserved, never interpreted.
    pub const SYS_REF: ResourceAttrs = ResourceAttrs(0x80);
    /// Load into the system heap instead of the application heap.
    pub const SYS_HEAP: ResourceAttrs = ResourceAttrs(0x40);
    /// The Memory Manager may purge the block.
    pub const PURGEABLE: ResourceAttrs = ResourceAttrs(0x20);
    /// The Memory Manager may not move the block.
    pub const LOCKED: ResourceAttrs = ResourceAttrs(0x10);
    /// Applications may not change the resource.
    pub const PROTECTED: ResourceAttrs = ResourceAttrs(0x08);
    /// Read into memory as soon as the file is opened.
    pub const PRELOAD: ResourceAttrs = ResourceAttrs(0x04);

    const CHANGED_BIT: u8 = 0x02;
    const COMPRESSED_BIT: u8 = 0x01;
    const STORAGE_BITS: u8 = Self::CHANGED_BIT | Self::COMPRESSED_BIT;

    const NAMED: [(&'static str, ResourceAttrs); 5] = [
        ("sysheap", Self::SYS_HEAP),
        ("purgeable", Self::PURGEABLE),
        ("locked", Self::LOCKED),
        ("protected", Self::PROTECTED),
        ("preload", Self::PRELOAD),
    ];

    #[inline]
    pub const fn empty() -> Self {
        ResourceAttrs(0)
    }

    /// Builds a flag set from a raw byte, dropping the storage-only bits.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        ResourceAttrs(bits & !Self::STORAGE_BITS)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: ResourceAttrs) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: ResourceAttrs) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: ResourceAttrs) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: ResourceAttrs, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Names of the set flags that have one, highest bit first.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(_, flag)| self.contains(*flag))
            .map(|(name, _)| name)
    }

    /// Looks up a flag by its name (`"sysheap"`, `"purgeable"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMED
            .iter()
            .find(|(flag_name, _)| *flag_name == name)
            .map(|(_, flag)| *flag)
    }

    /// Splits an on-disk attribute byte into user flags and the compressed bit.
    #[inline]
    pub(crate) fn split_disk(raw: u8) -> (Self, bool) {
        (Self::from_bits(raw), raw & Self::COMPRESSED_BIT != 0)
    }

    /// The byte to store on disk.
    #[inline]
    pub(crate) fn to_disk(self, compressed: bool) -> u8 {
        let bits = self.0 & !Self::STORAGE_BITS;
        if compressed {
            bits | Self::COMPRESSED_BIT
        } else {
            bits
        }
    }
}

impl BitOr for ResourceAttrs {
    type Output = ResourceAttrs;

    fn bitor(self, rhs: ResourceAttrs) -> ResourceAttrs {
        ResourceAttrs(self.0 | rhs.0)
    }
}

impl BitOrAssign for ResourceAttrs {
    fn bitor_assign(&mut self, rhs: ResourceAttrs) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ResourceAttrs {
    type Output = ResourceAttrs;

    fn bitand(self, rhs: ResourceAttrs) -> ResourceAttrs {
        ResourceAttrs(self.0 & rhs.0)
    }
}

impl fmt::Debug for ResourceAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceAttrs(0x{:02X}", self.0)?;
        let names: Vec<&str> = self.names().collect();
        if !names.is_empty() {
            write!(f, ": {}", names.join(" | "))?;
        }
        f.write_str(")")
    }
}

/// Lists flag names separated by `", "`, or `$XX` when an unnamed bit is set.
impl fmt::Display for ResourceAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Self::SYS_REF) {
            return write!(f, "${:02X}", self.0);
        }
        let names: Vec<&str> = self.names().collect();
        f.write_str(&names.join(", "))
    }
}
