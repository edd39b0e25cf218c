//! Flash backends usable under the filesystem.

pub mod memory;

pub use memory::MemoryFlash;
