use crate::devices::flash::FlashError;
use core::result::Result;
use thiserror::Error;

pub mod block;
pub mod fat16;
pub mod sync;

// Define error types for the filesystem operations
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum FsError {
    #[error("File not found")]
    NotFound,
    #[error("Invalid file name")]
    InvalidName,
    #[error("No free clusters")]
    NoSpace,
    #[error("Root directory full")]
    DirectoryFull,
    #[error("File too large")]
    FileTooLarge,
    #[error("Buffer too small")]
    BufferTooSmall,
    #[error("Corrupted cluster chain")]
    Corrupted,
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Sector out of range")]
    OutOfRange,
    #[error("Volume busy")]
    Busy,
    #[error("Flash error: {0}")]
    Flash(#[from] FlashError),
}

/// Represents a sector-addressed device as seen by a mass-storage host
pub trait BlockDevice {
    fn read_block(&mut self, block_num: u32, buf: &mut [u8]) -> Result<(), FsError>;
    fn write_block(&mut self, block_num: u32, buf: &[u8]) -> Result<(), FsError>;
    fn block_size(&self) -> usize;
    fn total_blocks(&self) -> u32;
}
