//! Volume layout, both as the host sees it (logical sectors) and as it is
//! placed on the flash part (physical byte offsets).

use super::flash::{FLASH_ERASE_SIZE, FLASH_SIZE};

/// Size of a logical sector in bytes
pub const SECTOR_SIZE: usize = 512;

/// Sectors per allocation cluster
pub const SECTORS_PER_CLUSTER: usize = 8;

/// Size of a cluster in bytes, equal to the flash erase unit
pub const CLUSTER_SIZE: usize = SECTORS_PER_CLUSTER * SECTOR_SIZE;

/// Sectors before the first FAT (the boot sector only)
pub const RESERVED_SECTORS: usize = 1;

/// Number of mirrored FAT copies
pub const FAT_COPIES: usize = 2;

/// Sectors occupied by one FAT copy
pub const SECTORS_PER_FAT: usize = 8;

/// Fixed number of root directory entries
pub const ROOT_DIR_ENTRIES: usize = 512;

/// Size of one directory entry in bytes
pub const DIR_ENTRY_SIZE: usize = 32;

/// Directory entries held by a single sector
pub const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;

/// Sectors occupied by the root directory
pub const ROOT_DIR_SECTORS: usize = ROOT_DIR_ENTRIES * DIR_ENTRY_SIZE / SECTOR_SIZE;

pub const BOOT_SECTOR: u32 = 0;
pub const FAT_START_SECTOR: u32 = RESERVED_SECTORS as u32;
pub const FAT2_START_SECTOR: u32 = FAT_START_SECTOR + SECTORS_PER_FAT as u32;
pub const ROOT_START_SECTOR: u32 = FAT_START_SECTOR + (FAT_COPIES * SECTORS_PER_FAT) as u32;
pub const DATA_START_SECTOR: u32 = ROOT_START_SECTOR + ROOT_DIR_SECTORS as u32;

/// Physical offset of the persisted boot record
pub const BOOT_FLASH_OFFSET: u32 = 0;
/// Physical offset of FAT1
pub const FAT_FLASH_OFFSET: u32 = FLASH_ERASE_SIZE as u32;
/// Physical offset of FAT2
pub const FAT2_FLASH_OFFSET: u32 = FAT_FLASH_OFFSET + (SECTORS_PER_FAT * SECTOR_SIZE) as u32;
/// Physical offset of the root directory
pub const ROOT_FLASH_OFFSET: u32 = FAT2_FLASH_OFFSET + (SECTORS_PER_FAT * SECTOR_SIZE) as u32;
/// Physical offset of cluster 2, start of the data window
pub const DATA_FLASH_OFFSET: u32 = ROOT_FLASH_OFFSET + (ROOT_DIR_SECTORS * SECTOR_SIZE) as u32;

/// Number of data clusters on the volume
pub const CLUSTER_COUNT: usize = (FLASH_SIZE - DATA_FLASH_OFFSET) as usize / CLUSTER_SIZE;

/// First allocatable cluster index; 0 and 1 are reserved
pub const FIRST_CLUSTER: u16 = 2;

/// One past the last allocatable cluster index
pub const CLUSTER_LIMIT: u16 = FIRST_CLUSTER + CLUSTER_COUNT as u16;

/// Data region size in sectors
pub const DATA_SECTORS: u32 = (CLUSTER_COUNT * SECTORS_PER_CLUSTER) as u32;

/// Logical sectors reported to the host
pub const TOTAL_SECTORS: u32 = DATA_START_SECTOR + DATA_SECTORS;

/// Largest file the file API accepts
pub const MAX_FILE_SIZE: usize = 128 * 1024;

/// Capacity of fixed-size file listings
pub const MAX_LISTED_FILES: usize = 16;

const _: () = assert!(CLUSTER_SIZE == FLASH_ERASE_SIZE, "cluster size must match erase size");
const _: () = assert!(FAT_FLASH_OFFSET as usize % FLASH_ERASE_SIZE == 0, "FAT not aligned");
const _: () = assert!(FAT2_FLASH_OFFSET as usize % FLASH_ERASE_SIZE == 0, "FAT2 not aligned");
const _: () = assert!(ROOT_FLASH_OFFSET as usize % FLASH_ERASE_SIZE == 0, "root not aligned");
const _: () = assert!(DATA_FLASH_OFFSET as usize % FLASH_ERASE_SIZE == 0, "data not aligned");
const _: () = assert!(
    SECTORS_PER_FAT * SECTOR_SIZE / 2 >= CLUSTER_LIMIT as usize,
    "FAT too small for cluster count"
);
const _: () = assert!(TOTAL_SECTORS <= u16::MAX as u32, "volume exceeds 16-bit sector count");
