//! NOR flash part geometry and driver timing limits.

/// Total capacity of the flash part in bytes (16 Mbit)
pub const FLASH_SIZE: u32 = 2 * 1024 * 1024;

/// Smallest erasable unit in bytes
pub const FLASH_ERASE_SIZE: usize = 4096;

/// Value every byte reads back as after an erase
pub const FLASH_ERASED_BYTE: u8 = 0xFF;

/// Upper bound on status polls for one erase/program before the
/// driver is considered hung and the system is reset.
pub const FLASH_BUSY_MAX_POLLS: usize = 5_000_000;
