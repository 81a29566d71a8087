// src/resource/mod.rs

pub mod attrs;
pub mod record;

pub use attrs::ResourceAttrs;
pub use record::{CacheState, ResType, Resource};
