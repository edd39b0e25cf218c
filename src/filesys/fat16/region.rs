//! Logical sector classification and physical placement

use crate::constants::volume::*;
use crate::filesys::FsError;

/// Disjoint ranges of the logical sector space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Boot,
    Fat1,
    Fat2,
    Root,
    Data,
}

impl Region {
    /// Classifies `lba`; every sector below `TOTAL_SECTORS` has a region.
    pub fn of(lba: u32) -> Result<Self, FsError> {
        match lba {
            BOOT_SECTOR => Ok(Region::Boot),
            _ if lba < FAT2_START_SECTOR => Ok(Region::Fat1),
            _ if lba < ROOT_START_SECTOR => Ok(Region::Fat2),
            _ if lba < DATA_START_SECTOR => Ok(Region::Root),
            _ if lba < TOTAL_SECTORS => Ok(Region::Data),
            _ => Err(FsError::OutOfRange),
        }
    }

    /// First logical sector of the region
    pub const fn start(self) -> u32 {
        match self {
            Region::Boot => BOOT_SECTOR,
            Region::Fat1 => FAT_START_SECTOR,
            Region::Fat2 => FAT2_START_SECTOR,
            Region::Root => ROOT_START_SECTOR,
            Region::Data => DATA_START_SECTOR,
        }
    }

    /// Physical flash offset of the region's first sector
    pub const fn flash_base(self) -> u32 {
        match self {
            Region::Boot => BOOT_FLASH_OFFSET,
            Region::Fat1 => FAT_FLASH_OFFSET,
            Region::Fat2 => FAT2_FLASH_OFFSET,
            Region::Root => ROOT_FLASH_OFFSET,
            Region::Data => DATA_FLASH_OFFSET,
        }
    }

    /// Whether the region is held in the sector cache
    pub const fn is_metadata(self) -> bool {
        matches!(self, Region::Fat1 | Region::Fat2 | Region::Root)
    }
}

/// Physical flash address of logical sector `lba`
pub fn physical_address(lba: u32) -> Result<u32, FsError> {
    let region = Region::of(lba)?;
    Ok(region.flash_base() + (lba - region.start()) * SECTOR_SIZE as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::flash::FLASH_SIZE;

    #[test]
    fn test_region_boundaries() {
        assert_eq!(Region::of(0), Ok(Region::Boot));
        assert_eq!(Region::of(1), Ok(Region::Fat1));
        assert_eq!(Region::of(8), Ok(Region::Fat1));
        assert_eq!(Region::of(9), Ok(Region::Fat2));
        assert_eq!(Region::of(16), Ok(Region::Fat2));
        assert_eq!(Region::of(17), Ok(Region::Root));
        assert_eq!(Region::of(48), Ok(Region::Root));
        assert_eq!(Region::of(49), Ok(Region::Data));
        assert_eq!(Region::of(TOTAL_SECTORS - 1), Ok(Region::Data));
        assert_eq!(Region::of(TOTAL_SECTORS), Err(FsError::OutOfRange));
    }

    #[test]
    fn test_physical_placement() {
        assert_eq!(physical_address(1), Ok(0x1000));
        assert_eq!(physical_address(9), Ok(0x2000));
        assert_eq!(physical_address(17), Ok(0x3000));
        assert_eq!(physical_address(48), Ok(0x6E00));
        assert_eq!(physical_address(49), Ok(0x7000));
        assert_eq!(
            physical_address(TOTAL_SECTORS - 1),
            Ok(FLASH_SIZE - SECTOR_SIZE as u32)
        );
    }
}
