//! Single-sector write-back cache over the metadata regions

use super::region::physical_address;
use crate::constants::flash::FLASH_ERASE_SIZE;
use crate::constants::volume::SECTOR_SIZE;
use crate::devices::flash::{self, FlashDevice};
use crate::filesys::FsError;

/// One resident logical sector plus its dirty state
pub struct SectorCache {
    /// Logical sector currently held, if any
    sector: Option<u32>,
    data: [u8; SECTOR_SIZE],
    dirty: bool,
}

impl Default for SectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SectorCache {
    pub const fn new() -> Self {
        Self {
            sector: None,
            data: [0; SECTOR_SIZE],
            dirty: false,
        }
    }

    /// Logical sector currently resident
    pub fn resident(&self) -> Option<u32> {
        self.sector
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Makes `sector` resident, writing back the previous line if needed.
    pub fn read_sector_to_cache<F: FlashDevice + ?Sized>(
        &mut self,
        flash: &mut F,
        scratch: &mut [u8; FLASH_ERASE_SIZE],
        sector: u32,
    ) -> Result<(), FsError> {
        if self.sector == Some(sector) {
            return Ok(());
        }

        self.flush_cache(flash, scratch)?;

        let addr = physical_address(sector)?;
        log::trace!("[CACHE] Load sector {} from {:#x}", sector, addr);
        if let Err(e) = flash::read(flash, addr, &mut self.data) {
            self.sector = None;
            return Err(e.into());
        }
        self.sector = Some(sector);
        Ok(())
    }

    /// Writes the resident line back if it was modified.
    pub fn flush_cache<F: FlashDevice + ?Sized>(
        &mut self,
        flash: &mut F,
        scratch: &mut [u8; FLASH_ERASE_SIZE],
    ) -> Result<(), FsError> {
        let Some(sector) = self.sector else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let addr = physical_address(sector)?;
        log::trace!("[CACHE] Flush sector {} to {:#x}", sector, addr);
        flash::rewrite_sector(flash, addr, &self.data, scratch)?;
        self.dirty = false;
        Ok(())
    }

    /// Contents of the resident line
    pub fn data(&self) -> &[u8; SECTOR_SIZE] {
        &self.data
    }

    /// Mutable contents of the resident line; marks it dirty
    pub fn data_mut(&mut self) -> &mut [u8; SECTOR_SIZE] {
        self.dirty = true;
        &mut self.data
    }

    /// Drops the resident line without writing it back
    pub fn invalidate(&mut self) {
        self.sector = None;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::flash::FLASH_SIZE;
    use crate::constants::volume::{FAT_START_SECTOR, ROOT_FLASH_OFFSET, ROOT_START_SECTOR};
    use crate::filesys::block::MemoryFlash;

    #[test]
    fn test_hit_does_not_touch_flash() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut flash = MemoryFlash::new(&mut cells);
        let mut scratch = [0u8; FLASH_ERASE_SIZE];
        let mut cache = SectorCache::new();

        cache.read_sector_to_cache(&mut flash, &mut scratch, ROOT_START_SECTOR).unwrap();
        flash.contents_mut()[ROOT_FLASH_OFFSET as usize] = 0x42;
        cache.read_sector_to_cache(&mut flash, &mut scratch, ROOT_START_SECTOR).unwrap();

        // still the line loaded before the raw change
        assert_eq!(cache.data()[0], 0xFF);
        assert_eq!(cache.resident(), Some(ROOT_START_SECTOR));
    }

    #[test]
    fn test_switching_sector_writes_back_dirty_line() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut flash = MemoryFlash::new(&mut cells);
        let mut scratch = [0u8; FLASH_ERASE_SIZE];
        let mut cache = SectorCache::new();

        cache.read_sector_to_cache(&mut flash, &mut scratch, ROOT_START_SECTOR).unwrap();
        cache.data_mut()[..4].copy_from_slice(b"ABCD");
        assert!(cache.is_dirty());
        assert_eq!(flash.mutation_count(), 0);

        cache.read_sector_to_cache(&mut flash, &mut scratch, FAT_START_SECTOR).unwrap();

        assert!(!cache.is_dirty());
        let root = ROOT_FLASH_OFFSET as usize;
        assert_eq!(&flash.contents()[root..root + 4], b"ABCD");
    }

    #[test]
    fn test_clean_flush_is_a_no_op() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut flash = MemoryFlash::new(&mut cells);
        let mut scratch = [0u8; FLASH_ERASE_SIZE];
        let mut cache = SectorCache::new();

        cache.flush_cache(&mut flash, &mut scratch).unwrap();
        cache.read_sector_to_cache(&mut flash, &mut scratch, FAT_START_SECTOR).unwrap();
        cache.flush_cache(&mut flash, &mut scratch).unwrap();

        assert_eq!(flash.mutation_count(), 0);
    }

    #[test]
    fn test_out_of_range_sector_is_rejected() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut flash = MemoryFlash::new(&mut cells);
        let mut scratch = [0u8; FLASH_ERASE_SIZE];
        let mut cache = SectorCache::new();

        assert_eq!(
            cache.read_sector_to_cache(&mut flash, &mut scratch, u32::MAX),
            Err(FsError::OutOfRange)
        );
        assert_eq!(cache.resident(), None);
    }
}
