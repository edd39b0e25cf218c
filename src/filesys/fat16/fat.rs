//! Mirrored cluster allocation table

use super::constants::FAT_ENTRY_SIZE;
use super::fat_entry::{is_data_cluster, FatEntry};
use super::Fat16;
use crate::constants::volume::*;
use crate::devices::flash::{self, FlashDevice};
use crate::filesys::FsError;

/// Sector (relative to the FAT start) and byte offset holding `cluster`
fn fat_location(cluster: u16) -> (u32, usize) {
    let offset = cluster as usize * FAT_ENTRY_SIZE;
    ((offset / SECTOR_SIZE) as u32, offset % SECTOR_SIZE)
}

impl<F: FlashDevice> Fat16<F> {
    /// Reads the FAT1 entry for `cluster`
    pub fn read_fat_entry(&mut self, cluster: u16) -> Result<FatEntry, FsError> {
        if cluster >= CLUSTER_LIMIT {
            return Err(FsError::OutOfRange);
        }
        let (sector, offset) = fat_location(cluster);
        let data = self.cached(FAT_START_SECTOR + sector)?;
        Ok(FatEntry::link(u16::from_le_bytes([
            data[offset],
            data[offset + 1],
        ])))
    }

    /// Writes the entry for `cluster` into both FAT copies, flushing after
    /// each so the copies never diverge on flash.
    pub fn write_fat_entry(&mut self, cluster: u16, entry: FatEntry) -> Result<(), FsError> {
        if !is_data_cluster(cluster) {
            return Err(FsError::OutOfRange);
        }
        let (sector, offset) = fat_location(cluster);
        for fat_start in [FAT_START_SECTOR, FAT2_START_SECTOR] {
            let data = self.cached_mut(fat_start + sector)?;
            data[offset..offset + FAT_ENTRY_SIZE].copy_from_slice(&entry.cluster.to_le_bytes());
            self.flush_cache()?;
        }
        Ok(())
    }

    /// First free cluster, scanning upward from cluster 2
    pub fn find_free_cluster(&mut self) -> Result<Option<u16>, FsError> {
        for cluster in FIRST_CLUSTER..CLUSTER_LIMIT {
            if self.read_fat_entry(cluster)?.is_free() {
                return Ok(Some(cluster));
            }
        }
        Ok(None)
    }

    /// Allocates a chain large enough for `size` bytes and returns its
    /// first cluster, or 0 when `size` is 0.
    ///
    /// On failure every cluster claimed by this call is released again.
    pub fn allocate_clusters(&mut self, size: usize) -> Result<u16, FsError> {
        if size == 0 {
            return Ok(0);
        }
        self.allocate_chain(size.div_ceil(CLUSTER_SIZE))
    }

    fn allocate_chain(&mut self, count: usize) -> Result<u16, FsError> {
        let mut first = 0;
        let mut last = None;

        for _ in 0..count {
            match self.extend_chain(last) {
                Ok(cluster) => {
                    if last.is_none() {
                        first = cluster;
                    }
                    last = Some(cluster);
                }
                Err(e) => {
                    log::warn!("[FAT16] Allocation of {} clusters failed: {}", count, e);
                    if first != 0 {
                        if let Err(rollback) = self.free_clusters(first) {
                            log::error!("[FAT16] Rollback of chain at {} failed: {}", first, rollback);
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(first)
    }

    /// Claims one free cluster as a chain end and links `prev` to it
    fn extend_chain(&mut self, prev: Option<u16>) -> Result<u16, FsError> {
        let cluster = self.find_free_cluster()?.ok_or(FsError::NoSpace)?;
        self.write_fat_entry(cluster, FatEntry::END_OF_CHAIN)?;
        if let Some(prev) = prev {
            self.write_fat_entry(prev, FatEntry::link(cluster))?;
        }
        Ok(cluster)
    }

    /// Releases the chain starting at `first` and returns the number of
    /// clusters freed.
    ///
    /// Stops at an end-of-chain marker, an already free entry or a link
    /// outside the data region. Walking more links than there are clusters
    /// means the chain loops and is reported as corruption.
    pub fn free_clusters(&mut self, first: u16) -> Result<usize, FsError> {
        let mut cluster = first;
        let mut freed = 0;

        while is_data_cluster(cluster) {
            if freed >= CLUSTER_COUNT {
                log::error!("[FAT16] Chain at {} does not terminate", first);
                return Err(FsError::Corrupted);
            }

            let entry = self.read_fat_entry(cluster)?;
            if entry.is_free() {
                break;
            }
            self.write_fat_entry(cluster, FatEntry::FREE)?;
            freed += 1;

            match entry.next_cluster() {
                Some(next) => cluster = next,
                None => break,
            }
        }

        log::debug!("[FAT16] Freed {} clusters from {}", freed, first);
        Ok(freed)
    }

    /// Next cluster of a chain, `None` at its end.
    pub fn next_in_chain(&mut self, cluster: u16) -> Result<Option<u16>, FsError> {
        let entry = self.read_fat_entry(cluster)?;
        if entry.is_end_of_chain() {
            return Ok(None);
        }
        match entry.next_cluster() {
            Some(next) => Ok(Some(next)),
            None => {
                log::error!("[FAT16] Cluster {} links to {:#06x}", cluster, entry.cluster);
                Err(FsError::Corrupted)
            }
        }
    }

    /// Cluster at position `index` of the chain starting at `first`
    pub(super) fn cluster_at(&mut self, first: u16, index: usize) -> Result<u16, FsError> {
        if !is_data_cluster(first) || index >= CLUSTER_COUNT {
            return Err(FsError::Corrupted);
        }
        let mut cluster = first;
        for _ in 0..index {
            cluster = self.next_in_chain(cluster)?.ok_or(FsError::Corrupted)?;
        }
        Ok(cluster)
    }

    /// Number of clusters in the chain starting at `first` (0 for none)
    pub fn chain_len(&mut self, first: u16) -> Result<usize, FsError> {
        if first == 0 {
            return Ok(0);
        }
        if !is_data_cluster(first) {
            return Err(FsError::Corrupted);
        }
        let mut cluster = first;
        let mut len = 1;
        while let Some(next) = self.next_in_chain(cluster)? {
            if len >= CLUSTER_COUNT {
                log::error!("[FAT16] Chain at {} does not terminate", first);
                return Err(FsError::Corrupted);
            }
            cluster = next;
            len += 1;
        }
        Ok(len)
    }

    pub fn count_free_clusters(&mut self) -> Result<usize, FsError> {
        let mut free = 0;
        for cluster in FIRST_CLUSTER..CLUSTER_LIMIT {
            if self.read_fat_entry(cluster)?.is_free() {
                free += 1;
            }
        }
        Ok(free)
    }

    /// Whether FAT1 and FAT2 are byte-identical on flash
    pub fn fat_mirror_consistent(&mut self) -> Result<bool, FsError> {
        self.flush_cache()?;

        let mut fat1 = [0u8; SECTOR_SIZE];
        let mut fat2 = [0u8; SECTOR_SIZE];
        for i in 0..SECTORS_PER_FAT as u32 {
            let offset = i * SECTOR_SIZE as u32;
            flash::read(&mut self.flash, FAT_FLASH_OFFSET + offset, &mut fat1)?;
            flash::read(&mut self.flash, FAT2_FLASH_OFFSET + offset, &mut fat2)?;
            if fat1 != fat2 {
                log::warn!("[FAT16] FAT copies differ in sector {}", i);
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::flash::FLASH_SIZE;
    use crate::filesys::block::MemoryFlash;

    #[test]
    fn test_entry_location() {
        assert_eq!(fat_location(2), (0, 4));
        assert_eq!(fat_location(255), (0, 510));
        assert_eq!(fat_location(256), (1, 0));
        assert_eq!(fat_location(CLUSTER_LIMIT - 1), (1, 500));
    }

    #[test]
    fn test_allocation_links_chain() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        let first = fs.allocate_clusters(3 * CLUSTER_SIZE - 1).unwrap();
        assert_eq!(first, FIRST_CLUSTER);
        assert_eq!(fs.read_fat_entry(2).unwrap(), FatEntry::link(3));
        assert_eq!(fs.read_fat_entry(3).unwrap(), FatEntry::link(4));
        assert!(fs.read_fat_entry(4).unwrap().is_end_of_chain());
        assert_eq!(fs.chain_len(first).unwrap(), 3);
        assert_eq!(fs.count_free_clusters().unwrap(), CLUSTER_COUNT - 3);
        assert!(fs.fat_mirror_consistent().unwrap());
    }

    #[test]
    fn test_zero_size_allocates_nothing() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        assert_eq!(fs.allocate_clusters(0).unwrap(), 0);
        assert_eq!(fs.chain_len(0).unwrap(), 0);
        assert_eq!(fs.count_free_clusters().unwrap(), CLUSTER_COUNT);
    }

    #[test]
    fn test_exhaustion_rolls_back() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        let held = fs.allocate_clusters((CLUSTER_COUNT - 2) * CLUSTER_SIZE).unwrap();
        assert_eq!(fs.allocate_clusters(3 * CLUSTER_SIZE), Err(FsError::NoSpace));
        assert_eq!(fs.count_free_clusters().unwrap(), 2);

        assert_eq!(fs.free_clusters(held).unwrap(), CLUSTER_COUNT - 2);
        assert_eq!(fs.count_free_clusters().unwrap(), CLUSTER_COUNT);
        assert!(fs.fat_mirror_consistent().unwrap());
    }

    #[test]
    fn test_free_stops_on_cycle() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        fs.write_fat_entry(2, FatEntry::link(3)).unwrap();
        fs.write_fat_entry(3, FatEntry::link(2)).unwrap();

        assert_eq!(fs.chain_len(2), Err(FsError::Corrupted));
        assert_eq!(fs.free_clusters(2).unwrap(), 2);
        assert_eq!(fs.count_free_clusters().unwrap(), CLUSTER_COUNT);
    }

    #[test]
    fn test_broken_link_is_corruption() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        fs.write_fat_entry(2, FatEntry::link(1)).unwrap();
        assert_eq!(fs.next_in_chain(2), Err(FsError::Corrupted));

        fs.write_fat_entry(2, FatEntry::FREE).unwrap();
        assert_eq!(fs.next_in_chain(2), Err(FsError::Corrupted));
    }

    #[test]
    fn test_reserved_entries_are_not_writable() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        assert_eq!(fs.write_fat_entry(0, FatEntry::FREE), Err(FsError::OutOfRange));
        assert_eq!(fs.write_fat_entry(CLUSTER_LIMIT, FatEntry::FREE), Err(FsError::OutOfRange));
        assert_eq!(fs.read_fat_entry(0).unwrap(), FatEntry::link(0xFFF8));
    }

    #[test]
    fn test_mirror_divergence_is_detected() {
        let mut cells = vec![0u8; FLASH_SIZE as usize];
        let mut fs = Fat16::mount(MemoryFlash::new(&mut cells)).unwrap();

        fs.flash_mut().contents_mut()[FAT2_FLASH_OFFSET as usize + 8] = 0x00;
        assert!(fs.fat_mirror_consistent().unwrap());

        fs.flash_mut().contents_mut()[FAT2_FLASH_OFFSET as usize + 8] = 0x07;
        assert!(!fs.fat_mirror_consistent().unwrap());
    }
}
