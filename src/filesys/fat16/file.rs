//! File-level API
//!
//! File contents never pass through the sector cache: every cluster of a
//! rewritten file is erased and programmed directly, and reads copy
//! straight from flash.

use super::dir::FileInfo;
use super::dir_entry::DirEntry83;
use super::fat_entry::{is_data_cluster, FatEntry};
use super::name::ShortName;
use super::Fat16;
use crate::constants::flash::FLASH_ERASED_BYTE;
use crate::constants::volume::*;
use crate::devices::flash::{self, FlashDevice};
use crate::filesys::FsError;
use core::cmp::min;

/// Read cursor over one file's cluster chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle {
    /// File size in bytes
    size: u32,
    /// Current position in file
    position: u32,
    /// Cluster holding the byte before `position`, or the first cluster
    current_cluster: u16,
}

impl FileHandle {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn remaining(&self) -> u32 {
        self.size - self.position
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.size
    }
}

/// Physical flash address of data cluster `cluster`
pub fn cluster_address(cluster: u16) -> u32 {
    debug_assert!(is_data_cluster(cluster));
    DATA_FLASH_OFFSET + (cluster - FIRST_CLUSTER) as u32 * CLUSTER_SIZE as u32
}

fn validate_name(name: &ShortName) -> Result<(), FsError> {
    if name.is_valid() {
        Ok(())
    } else {
        Err(FsError::InvalidName)
    }
}

impl<F: FlashDevice> Fat16<F> {
    /// Creates `name` or replaces its contents with `data`.
    ///
    /// The old chain is always released and a fresh one allocated. If the
    /// new contents cannot be stored, an existing entry is deleted rather
    /// than left pointing at released clusters.
    pub fn write_file(&mut self, name: &ShortName, data: &[u8]) -> Result<(), FsError> {
        validate_name(name)?;
        if data.len() > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }

        let existing = self.find_file_entry(name)?;
        let created = match &existing {
            Some((_, entry)) => {
                if entry.start_cluster != 0 {
                    self.free_clusters(entry.start_cluster)?;
                }
                entry.created
            }
            None => self.timestamp,
        };

        let stored = self
            .allocate_clusters(data.len())
            .and_then(|first| match self.program_chain(first, data) {
                Ok(()) => Ok(first),
                Err(e) => {
                    if let Err(rollback) = self.free_clusters(first) {
                        log::error!("[FAT16] Rollback of chain at {} failed: {}", first, rollback);
                    }
                    Err(e)
                }
            });

        let first = match stored {
            Ok(first) => first,
            Err(e) => {
                log::warn!("[FAT16] Writing {} failed: {}", name, e);
                if let Some((slot, _)) = existing {
                    self.tombstone(slot)?;
                }
                return Err(e);
            }
        };

        let entry = DirEntry83::new_file(*name, first, data.len() as u32, created, self.timestamp);
        if let Err(e) = self.update_file_entry(&entry) {
            if let Err(rollback) = self.free_clusters(first) {
                log::error!("[FAT16] Rollback of chain at {} failed: {}", first, rollback);
            }
            return Err(e);
        }

        log::debug!("[FAT16] Wrote {} ({} bytes, first cluster {})", name, data.len(), first);
        Ok(())
    }

    /// Erases each cluster of the chain at `first` and programs `data`
    /// into it, one cluster-sized chunk per cluster.
    fn program_chain(&mut self, first: u16, data: &[u8]) -> Result<(), FsError> {
        let mut cluster = first;
        for (i, chunk) in data.chunks(CLUSTER_SIZE).enumerate() {
            if i > 0 {
                cluster = self.next_in_chain(cluster)?.ok_or(FsError::Corrupted)?;
            }
            let addr = cluster_address(cluster);
            flash::erase(&mut self.flash, addr)?;
            flash::program(&mut self.flash, addr, chunk)?;
        }
        Ok(())
    }

    /// Copies the contents of `name` into `buf` and returns the file size.
    pub fn read_file(&mut self, name: &ShortName, buf: &mut [u8]) -> Result<usize, FsError> {
        validate_name(name)?;
        let (_, entry) = self.find_file_entry(name)?.ok_or(FsError::NotFound)?;

        let size = entry.file_size as usize;
        if buf.len() < size {
            return Err(FsError::BufferTooSmall);
        }

        let mut handle = Self::handle_for(&entry);
        let read = self.read_bytes(&mut handle, &mut buf[..size])?;
        debug_assert_eq!(read, size);
        Ok(size)
    }

    /// Opens `name` for streaming reads
    pub fn open(&mut self, name: &ShortName) -> Result<FileHandle, FsError> {
        validate_name(name)?;
        let (_, entry) = self.find_file_entry(name)?.ok_or(FsError::NotFound)?;
        Ok(Self::handle_for(&entry))
    }

    fn handle_for(entry: &DirEntry83) -> FileHandle {
        FileHandle {
            size: entry.file_size,
            position: 0,
            current_cluster: entry.start_cluster,
        }
    }

    /// Reads from the handle's position into `buf`, returning the number of
    /// bytes read (0 at end of file).
    pub fn read_bytes(&mut self, handle: &mut FileHandle, buf: &mut [u8]) -> Result<usize, FsError> {
        let mut done = 0;

        while done < buf.len() && !handle.is_eof() {
            let offset = handle.position as usize % CLUSTER_SIZE;
            if offset == 0 && handle.position != 0 {
                handle.current_cluster = self
                    .next_in_chain(handle.current_cluster)?
                    .ok_or(FsError::Corrupted)?;
            }
            if !is_data_cluster(handle.current_cluster) {
                log::error!(
                    "[FAT16] File data at invalid cluster {}",
                    handle.current_cluster
                );
                return Err(FsError::Corrupted);
            }

            let len = min(
                min(CLUSTER_SIZE - offset, buf.len() - done),
                handle.remaining() as usize,
            );
            let addr = cluster_address(handle.current_cluster) + offset as u32;
            flash::read(&mut self.flash, addr, &mut buf[done..done + len])?;

            done += len;
            handle.position += len as u32;
        }

        Ok(done)
    }

    /// Adds `data` to the end of `name`, creating it if absent.
    ///
    /// Existing clusters are kept. The tail cluster is programmed in place
    /// while its unused part is still erased and rewritten otherwise.
    pub fn append_file(&mut self, name: &ShortName, data: &[u8]) -> Result<(), FsError> {
        validate_name(name)?;
        let Some((_, mut entry)) = self.find_file_entry(name)? else {
            return self.write_file(name, data);
        };
        if entry.file_size == 0 {
            return self.write_file(name, data);
        }
        if data.is_empty() {
            return Ok(());
        }

        let old_size = entry.file_size as usize;
        let new_size = old_size + data.len();
        if new_size > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }

        let tail = self.cluster_at(entry.start_cluster, (old_size - 1) / CLUSTER_SIZE)?;
        if let Some(spare) = self.next_in_chain(tail)? {
            // chain longer than the file needs
            self.write_fat_entry(tail, FatEntry::END_OF_CHAIN)?;
            self.free_clusters(spare)?;
        }

        let mut rest = data;
        let used = old_size % CLUSTER_SIZE;
        if used != 0 {
            let len = min(CLUSTER_SIZE - used, rest.len());
            self.fill_tail(tail, used, &rest[..len])?;
            rest = &rest[len..];
        }

        if !rest.is_empty() {
            let first = self.allocate_clusters(rest.len())?;
            let linked = self
                .program_chain(first, rest)
                .and_then(|()| self.write_fat_entry(tail, FatEntry::link(first)));
            if let Err(e) = linked {
                if let Err(rollback) = self.free_clusters(first) {
                    log::error!("[FAT16] Rollback of chain at {} failed: {}", first, rollback);
                }
                return Err(e);
            }
        }

        entry.file_size = new_size as u32;
        entry.modified = self.timestamp;
        entry.last_access_date = self.timestamp.date;
        self.update_file_entry(&entry)?;

        log::debug!("[FAT16] Appended {} bytes to {}", data.len(), name);
        Ok(())
    }

    /// Stores `data` at byte `used` of `cluster`, keeping the bytes before it.
    fn fill_tail(&mut self, cluster: u16, used: usize, data: &[u8]) -> Result<(), FsError> {
        let addr = cluster_address(cluster);
        let end = used + data.len();

        flash::read(&mut self.flash, addr, &mut self.scratch)?;
        if self.scratch[used..end].iter().all(|&b| b == FLASH_ERASED_BYTE) {
            flash::program(&mut self.flash, addr + used as u32, data)?;
            return Ok(());
        }

        self.scratch[used..end].copy_from_slice(data);
        flash::erase(&mut self.flash, addr)?;
        flash::program(&mut self.flash, addr, &self.scratch[..end])?;
        Ok(())
    }

    /// Releases the chain of `name` and tombstones its entry. The cluster
    /// contents stay on flash.
    pub fn delete_file(&mut self, name: &ShortName) -> Result<(), FsError> {
        validate_name(name)?;
        let (slot, entry) = self.find_file_entry(name)?.ok_or(FsError::NotFound)?;

        if entry.start_cluster != 0 {
            self.free_clusters(entry.start_cluster)?;
        }
        self.tombstone(slot)?;

        log::debug!("[FAT16] Deleted {}", name);
        Ok(())
    }

    pub fn file_exists(&mut self, name: &ShortName) -> Result<bool, FsError> {
        Ok(name.is_valid() && self.find_file_entry(name)?.is_some())
    }

    pub fn file_info(&mut self, name: &ShortName) -> Result<FileInfo, FsError> {
        validate_name(name)?;
        let (_, entry) = self.find_file_entry(name)?.ok_or(FsError::NotFound)?;
        Ok(FileInfo::from(&entry))
    }

    /// Bytes held by free clusters
    pub fn get_free_space(&mut self) -> Result<u32, FsError> {
        Ok((self.count_free_clusters()? * CLUSTER_SIZE) as u32)
    }

    /// Bytes held by all data clusters
    pub fn get_total_space(&self) -> u32 {
        (CLUSTER_COUNT * CLUSTER_SIZE) as u32
    }
}
