//! Mass-storage sector interface.
//!
//! The host addresses the volume as `TOTAL_SECTORS` sectors of 512 bytes.
//! LBA 0 is synthesized, FAT and root sectors go through the sector cache
//! and data sectors are read and rewritten on flash directly.

use super::boot_sector::BootSector;
use super::region::{physical_address, Region};
use super::Fat16;
use crate::constants::volume::{SECTOR_SIZE, TOTAL_SECTORS};
use crate::devices::flash::{self, FlashDevice};
use crate::filesys::{BlockDevice, FsError};
use core::ops::{Deref, DerefMut};

/// Alignment transfer buffers must have for the transport's DMA
pub const DMA_ALIGNMENT: usize = 4;

/// One sector, aligned for DMA transfers
#[repr(C, align(4))]
#[derive(Clone)]
pub struct SectorBuf(pub [u8; SECTOR_SIZE]);

impl SectorBuf {
    pub const fn new() -> Self {
        Self([0; SECTOR_SIZE])
    }
}

impl Default for SectorBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for SectorBuf {
    type Target = [u8; SECTOR_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SectorBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Accepts exactly one sector in a DMA-aligned buffer
fn check_request(ptr: *const u8, len: usize) -> Result<(), FsError> {
    if len != SECTOR_SIZE || ptr as usize % DMA_ALIGNMENT != 0 {
        log::warn!("[USB] Rejected request of {} bytes at {:p}", len, ptr);
        return Err(FsError::InvalidRequest);
    }
    Ok(())
}

impl<F: FlashDevice> Fat16<F> {
    /// Sector count and sector size reported to the host
    pub fn get_capacity(&self) -> (u32, u32) {
        (TOTAL_SECTORS, SECTOR_SIZE as u32)
    }

    /// Serves a host read of logical sector `lba`.
    pub fn sector_read(&mut self, lba: u32, buf: &mut [u8]) -> Result<(), FsError> {
        check_request(buf.as_ptr(), buf.len())?;
        let buf: &mut [u8; SECTOR_SIZE] = buf.try_into().map_err(|_| FsError::InvalidRequest)?;

        match Region::of(lba)? {
            Region::Boot => BootSector::volume().write_to(buf),
            region if region.is_metadata() => buf.copy_from_slice(self.cached(lba)?),
            _ => flash::read(&mut self.flash, physical_address(lba)?, buf)?,
        }
        Ok(())
    }

    /// Serves a host write of logical sector `lba`.
    ///
    /// Writes to LBA 0 are accepted and dropped. FAT and root writes stay
    /// in the cache until another sector is needed or `sync` is called.
    pub fn sector_write(&mut self, lba: u32, buf: &[u8]) -> Result<(), FsError> {
        check_request(buf.as_ptr(), buf.len())?;
        let buf: &[u8; SECTOR_SIZE] = buf.try_into().map_err(|_| FsError::InvalidRequest)?;

        match Region::of(lba)? {
            Region::Boot => log::debug!("[USB] Ignoring boot sector write"),
            region if region.is_metadata() => self.cached_mut(lba)?.copy_from_slice(buf),
            _ => flash::rewrite_sector(
                &mut self.flash,
                physical_address(lba)?,
                buf,
                &mut self.scratch,
            )?,
        }
        Ok(())
    }

    /// Writes back whatever the host left pending in the cache
    pub fn sync(&mut self) -> Result<(), FsError> {
        self.flush_cache()
    }
}

impl<F: FlashDevice> BlockDevice for Fat16<F> {
    fn read_block(&mut self, block_num: u32, buf: &mut [u8]) -> Result<(), FsError> {
        self.sector_read(block_num, buf)
    }

    fn write_block(&mut self, block_num: u32, buf: &[u8]) -> Result<(), FsError> {
        self.sector_write(block_num, buf)
    }

    fn block_size(&self) -> usize {
        SECTOR_SIZE
    }

    fn total_blocks(&self) -> u32 {
        TOTAL_SECTORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::flash::FLASH_SIZE;
    use crate::constants::volume::*;
    use crate::filesys::block::MemoryFlash;

    #[repr(C, align(4))]
    struct WideBuf([u8; SECTOR_SIZE + DMA_ALIGNMENT]);

    #[test]
    fn test_boot_sector_survives_host_writes() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();
        let before = fs.flash().mutation_count();

        fs.sector_write(0, &SectorBuf::new()[..]).unwrap();
        assert_eq!(fs.flash().mutation_count(), before);

        let mut buf = SectorBuf::new();
        fs.sector_read(0, &mut buf[..]).unwrap();
        assert_eq!(&buf[510..], &[0x55, 0xAA]);
    }

    #[test]
    fn test_rejects_partial_and_misaligned_requests() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        let mut short = SectorBuf::new();
        assert_eq!(
            fs.sector_read(DATA_START_SECTOR, &mut short[..256]),
            Err(FsError::InvalidRequest)
        );

        // one byte into a 4-aligned buffer, still a full sector long
        let mut wide = WideBuf([0; SECTOR_SIZE + DMA_ALIGNMENT]);
        let misaligned = &mut wide.0[1..SECTOR_SIZE + 1];
        assert_eq!(
            fs.sector_read(DATA_START_SECTOR, misaligned),
            Err(FsError::InvalidRequest)
        );
        assert_eq!(
            fs.sector_write(DATA_START_SECTOR, misaligned),
            Err(FsError::InvalidRequest)
        );
    }

    #[test]
    fn test_every_lba_is_answered() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();
        let (count, size) = fs.get_capacity();
        assert_eq!(size, 512);

        let mut buf = SectorBuf::new();
        for lba in 0..count {
            fs.sector_read(lba, &mut buf[..]).unwrap();
        }
        assert_eq!(fs.sector_read(count, &mut buf[..]), Err(FsError::OutOfRange));
    }

    #[test]
    fn test_metadata_writes_are_cached_until_sync() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        let mut buf = SectorBuf::new();
        buf[..11].copy_from_slice(b"HOST    TXT");
        buf[11] = 0x20;
        fs.sector_write(ROOT_START_SECTOR, &buf[..]).unwrap();

        let root = ROOT_FLASH_OFFSET as usize;
        assert_eq!(fs.flash().contents()[root], 0);

        fs.sync().unwrap();
        assert_eq!(&fs.flash().contents()[root..root + 11], b"HOST    TXT");
    }

    #[test]
    fn test_data_sectors_bypass_cache() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        let mut buf = SectorBuf::new();
        buf.fill(0x3C);
        let lba = DATA_START_SECTOR + 9;
        fs.sector_write(lba, &buf[..]).unwrap();

        let addr = physical_address(lba).unwrap() as usize;
        assert!(fs.flash().contents()[addr..addr + SECTOR_SIZE].iter().all(|&b| b == 0x3C));

        let mut back = SectorBuf::new();
        fs.sector_read(lba, &mut back[..]).unwrap();
        assert_eq!(back.0, buf.0);
    }
}
