//! FAT16 volume stored directly on NOR flash.
//!
//! The metadata regions (boot record, both FATs, root directory) live in a
//! low physical window and are accessed through a one-sector write-back
//! cache. File data lives in a separate window where one cluster is exactly
//! one flash erase unit, and is read and written directly.

use crate::constants::flash::{FLASH_ERASE_SIZE, FLASH_SIZE};
use crate::constants::volume::*;
use crate::devices::flash::{self, FlashDevice, FlashError};
use crate::filesys::FsError;

mod boot_sector;
mod bridge;
mod cache;
pub mod constants;
mod date;
mod dir;
mod dir_entry;
mod fat;
mod fat_entry;
mod file;
mod name;
mod region;

pub use boot_sector::BootSector;
pub use bridge::{SectorBuf, DMA_ALIGNMENT};
pub use cache::SectorCache;
pub use date::FatTimestamp;
pub use dir::FileInfo;
pub use dir_entry::{DirAttributes, DirEntry83};
pub use fat_entry::FatEntry;
pub use file::FileHandle;
pub use name::{DisplayName, ShortName};
pub use region::{physical_address, Region};

use constants::MEDIA_DESCRIPTOR;

/// FAT16 filesystem driver
///
/// Owns the flash part and every piece of mutable filesystem state, so
/// independent volumes never share anything.
pub struct Fat16<F: FlashDevice> {
    /// Underlying flash part
    flash: F,
    /// Resident metadata sector
    cache: SectorCache,
    /// Staging area for erase-unit rewrites
    scratch: [u8; FLASH_ERASE_SIZE],
    /// Stamp recorded on created and modified entries
    timestamp: FatTimestamp,
}

impl<F: FlashDevice> Fat16<F> {
    /// Mounts the volume on `flash`, formatting it first if the persisted
    /// boot record is missing its signature.
    pub fn mount(flash: F) -> Result<Self, FsError> {
        if flash.capacity() < FLASH_SIZE {
            log::error!(
                "[FAT16] Flash too small: {} bytes, need {}",
                flash.capacity(),
                FLASH_SIZE
            );
            return Err(FlashError::OutOfBounds.into());
        }

        let mut fs = Self {
            flash,
            cache: SectorCache::new(),
            scratch: [0; FLASH_ERASE_SIZE],
            timestamp: FatTimestamp::VOLUME_CREATED,
        };

        let mut boot = [0u8; SECTOR_SIZE];
        flash::read(&mut fs.flash, BOOT_FLASH_OFFSET, &mut boot)?;
        if boot_sector::has_signature(&boot) {
            log::info!("[FAT16] Mounted existing volume");
        } else {
            log::info!("[FAT16] No valid boot record, formatting");
            fs.format()?;
        }

        Ok(fs)
    }

    /// Writes an empty volume: both FATs with only the reserved entries
    /// set, a zeroed root directory and the boot record.
    pub fn format(&mut self) -> Result<(), FsError> {
        self.cache.invalidate();

        self.scratch.fill(0);
        self.scratch[..4].copy_from_slice(&[MEDIA_DESCRIPTOR, 0xFF, 0xFF, 0xFF]);
        for base in [FAT_FLASH_OFFSET, FAT2_FLASH_OFFSET] {
            flash::erase(&mut self.flash, base)?;
            flash::program(
                &mut self.flash,
                base,
                &self.scratch[..SECTORS_PER_FAT * SECTOR_SIZE],
            )?;
        }

        self.scratch.fill(0);
        let root_len = (ROOT_DIR_SECTORS * SECTOR_SIZE) as u32;
        for addr in (ROOT_FLASH_OFFSET..ROOT_FLASH_OFFSET + root_len).step_by(FLASH_ERASE_SIZE) {
            flash::erase(&mut self.flash, addr)?;
            flash::program(&mut self.flash, addr, &self.scratch)?;
        }

        // boot record last: an interrupted format is redone on next mount
        let mut boot = [0u8; SECTOR_SIZE];
        BootSector::volume().write_to(&mut boot);
        flash::erase(&mut self.flash, BOOT_FLASH_OFFSET)?;
        flash::program(&mut self.flash, BOOT_FLASH_OFFSET, &boot)?;

        log::info!(
            "[FAT16] Formatted: {} clusters of {} bytes",
            CLUSTER_COUNT,
            CLUSTER_SIZE
        );
        Ok(())
    }

    /// Writes back pending metadata and hands the flash part back.
    pub fn unmount(mut self) -> Result<F, FsError> {
        self.flush_cache()?;
        Ok(self.flash)
    }

    /// Sets the stamp recorded on entries created or modified from now on
    pub fn set_timestamp(&mut self, timestamp: FatTimestamp) {
        self.timestamp = timestamp;
    }

    pub fn timestamp(&self) -> FatTimestamp {
        self.timestamp
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Raw access to the part. Bypasses the sector cache; call
    /// `flush_cache` first if metadata may be pending.
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Writes back the resident metadata sector if it is dirty.
    pub fn flush_cache(&mut self) -> Result<(), FsError> {
        self.cache.flush_cache(&mut self.flash, &mut self.scratch)
    }

    fn cached(&mut self, sector: u32) -> Result<&[u8; SECTOR_SIZE], FsError> {
        self.cache
            .read_sector_to_cache(&mut self.flash, &mut self.scratch, sector)?;
        Ok(self.cache.data())
    }

    fn cached_mut(&mut self, sector: u32) -> Result<&mut [u8; SECTOR_SIZE], FsError> {
        self.cache
            .read_sector_to_cache(&mut self.flash, &mut self.scratch, sector)?;
        Ok(self.cache.data_mut())
    }
}
