//! Compile-time configuration of the flash part and the volume laid on it.

pub mod flash;
pub mod volume;
