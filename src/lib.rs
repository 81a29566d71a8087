//! # Mac Resource Fork Library
//!
//! Reads and writes classic Mac OS resource forks, and expands and packs
//! resource data stored with the System 7 "GreggyBits" compression.
//!
//! This library is organized into several modules:
//! - `utils`: Error handling and big-endian byte reading helpers
//! - `compress`: Compressed-resource headers and the GreggyBits codec
//! - `resource`: Resource records, types and attributes
//! - `fork`: Parsing and serializing whole resource forks
//!
//! ```no_run
//! use macrsrc::{ReadParams, WriteParams, parse_all, serialize};
//!
//! # fn main() -> macrsrc::Result<()> {
//! let fork = std::fs::read("Example.rsrc")?;
//! let mut resources = parse_all(&fork, ReadParams::default())?;
//! for res in &mut resources {
//!     let len = res.data()?.len();
//!     println!("{} {} {} bytes", res.res_type, res.id, len);
//! }
//! let rewritten = serialize(resources, &WriteParams::default())?;
//! # let _ = rewritten;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used types at the crate root
pub use utils::error::{ResourceError, Result};

// Core modules
pub mod utils {
    pub mod bytes;
    pub mod error;
}

pub mod compress;
pub mod fork;
pub mod resource;

// Public API exports
pub use compress::{
    CompressionFormat, GreggParams, RunLayout, TableChoice, classify, compress, compress_with,
    decompress,
};
pub use fork::{ForkReader, ReadParams, WriteParams, parse, parse_all, serialize};
pub use resource::{CacheState, ResType, Resource, ResourceAttrs};

// Constants
pub const MACRSRC_VERSION: &str = env!("CARGO_PKG_VERSION");
