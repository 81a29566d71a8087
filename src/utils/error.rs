use std::io;
use thiserror::Error;

/// Main error type for the resource fork library.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input ended before a declared structure was complete.
    #[error("Truncated input: {what} needs {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        what: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A compressed stream referenced a word past the end of its lookup table.
    #[error("Table index {index} out of range for a {table_len}-entry lookup table")]
    TableIndexOutOfRange { index: u8, table_len: usize },

    /// The requested algorithm or mode exists in the format but is not implemented.
    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),

    /// Resource data uses an unrecognised compression and expansion was not opted into.
    #[error("Unknown compression format")]
    UnknownCompression,

    /// The reserved-header pseudo-resource does not fit in the free header area.
    #[error("Reserved header payload is {0} bytes, at most 240 fit")]
    HeaderPayloadTooLong(usize),

    /// A resource name is longer than a Pascal string can hold.
    #[error("Resource name is {0} bytes, at most 255 allowed")]
    NameTooLong(usize),

    /// A resource name has characters with no Mac Roman equivalent.
    #[error("Resource name {0:?} cannot be encoded as Mac Roman")]
    NameEncoding(String),

    /// An offset grew past the width of the field that stores it.
    #[error("{what} offset {value} does not fit in its field")]
    OffsetOverflow { what: &'static str, value: usize },

    /// More types or resources than the map can count.
    #[error("Too many {what}: {count}")]
    TooManyEntries { what: &'static str, count: usize },

    /// An invalid argument was provided
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
}

impl ResourceError {
    /// Maps an `UnexpectedEof` from a byteorder read into a `Truncated` error.
    pub(crate) fn from_read(
        err: io::Error,
        what: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    ) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ResourceError::Truncated {
                what,
                offset,
                needed,
                available,
            }
        } else {
            ResourceError::Io(err)
        }
    }
}

/// A specialized `Result` type for resource fork operations.
pub type Result<T> = std::result::Result<T, ResourceError>;
