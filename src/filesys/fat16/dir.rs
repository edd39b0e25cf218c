//! Root directory management
//!
//! The root directory is a fixed array of 32-byte slots. A slot whose first
//! byte is 0 ends the in-use region, so scans stop there and new entries
//! always take the earliest reusable slot; no live entry is ever placed
//! after an end marker.

use super::constants::{DELETED_ENTRY_MARKER, END_OF_DIR_MARKER, SHORT_NAME_LEN};
use super::date::FatTimestamp;
use super::dir_entry::{self, DirEntry83};
use super::name::{DisplayName, ShortName};
use super::Fat16;
use crate::constants::volume::*;
use crate::devices::flash::FlashDevice;
use crate::filesys::FsError;
use arrayvec::ArrayVec;
use core::ops::ControlFlow;

/// File listing record
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub name: DisplayName,
    pub size: u32,
    pub created: FatTimestamp,
    pub modified: FatTimestamp,
}

impl From<&DirEntry83> for FileInfo {
    fn from(entry: &DirEntry83) -> Self {
        Self {
            name: entry.name.to_display(),
            size: entry.file_size,
            created: entry.created,
            modified: entry.modified,
        }
    }
}

/// Logical sector and byte offset of a root directory slot
fn slot_location(slot: usize) -> (u32, usize) {
    (
        ROOT_START_SECTOR + (slot / ENTRIES_PER_SECTOR) as u32,
        (slot % ENTRIES_PER_SECTOR) * DIR_ENTRY_SIZE,
    )
}

impl<F: FlashDevice> Fat16<F> {
    /// Visits root slots in order, up to and including the first end
    /// marker. Returns the value the visitor broke with, if any.
    fn scan_root<T>(
        &mut self,
        mut visit: impl FnMut(usize, &[u8]) -> ControlFlow<T>,
    ) -> Result<Option<T>, FsError> {
        for index in 0..ROOT_DIR_SECTORS {
            let data = self.cached(ROOT_START_SECTOR + index as u32)?;
            for (i, raw) in data.chunks_exact(DIR_ENTRY_SIZE).enumerate() {
                if let ControlFlow::Break(found) = visit(index * ENTRIES_PER_SECTOR + i, raw) {
                    return Ok(Some(found));
                }
                if dir_entry::is_end(raw) {
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    /// Looks up a live file entry by its raw 8.3 name.
    pub fn find_file_entry(
        &mut self,
        name: &ShortName,
    ) -> Result<Option<(usize, DirEntry83)>, FsError> {
        self.scan_root(|slot, raw| {
            if dir_entry::is_listed(raw) && raw[..SHORT_NAME_LEN] == name.as_bytes()[..] {
                ControlFlow::Break((slot, DirEntry83::parse(raw)))
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    /// Stores `entry`, overwriting the live entry with the same name or
    /// taking the earliest free slot. Returns the slot used.
    pub fn update_file_entry(&mut self, entry: &DirEntry83) -> Result<usize, FsError> {
        if let Some((slot, _)) = self.find_file_entry(&entry.name)? {
            self.write_slot(slot, entry)?;
            return Ok(slot);
        }
        self.claim_free_slot(entry)
    }

    fn claim_free_slot(&mut self, entry: &DirEntry83) -> Result<usize, FsError> {
        let free = self.scan_root(|slot, raw| {
            if dir_entry::is_reusable(raw) {
                ControlFlow::Break((slot, dir_entry::is_end(raw)))
            } else {
                ControlFlow::Continue(())
            }
        })?;

        let Some((slot, was_end)) = free else {
            log::warn!("[FAT16] Root directory full");
            return Err(FsError::DirectoryFull);
        };

        self.write_slot(slot, entry)?;

        // the end marker moves down one slot
        if was_end && slot + 1 < ROOT_DIR_ENTRIES {
            let (sector, offset) = slot_location(slot + 1);
            if self.cached(sector)?[offset] != END_OF_DIR_MARKER {
                self.cached_mut(sector)?[offset] = END_OF_DIR_MARKER;
                self.flush_cache()?;
            }
        }
        Ok(slot)
    }

    fn write_slot(&mut self, slot: usize, entry: &DirEntry83) -> Result<(), FsError> {
        let (sector, offset) = slot_location(slot);
        let data = self.cached_mut(sector)?;
        entry.write_to(&mut data[offset..offset + DIR_ENTRY_SIZE]);
        self.flush_cache()
    }

    /// Marks `slot` deleted; the rest of the record is left in place
    pub(super) fn tombstone(&mut self, slot: usize) -> Result<(), FsError> {
        let (sector, offset) = slot_location(slot);
        self.cached_mut(sector)?[offset] = DELETED_ENTRY_MARKER;
        self.flush_cache()
    }

    /// Fills `out` with the live files in directory order and returns how
    /// many were written.
    pub fn list_files(&mut self, out: &mut [FileInfo]) -> Result<usize, FsError> {
        let mut count = 0;
        self.scan_root(|_, raw| {
            if count == out.len() {
                return ControlFlow::Break(());
            }
            if dir_entry::is_listed(raw) {
                out[count] = FileInfo::from(&DirEntry83::parse(raw));
                count += 1;
            }
            ControlFlow::Continue(())
        })?;
        Ok(count)
    }

    /// Up to `MAX_LISTED_FILES` live files in directory order
    pub fn files(&mut self) -> Result<ArrayVec<FileInfo, MAX_LISTED_FILES>, FsError> {
        let mut files = ArrayVec::new();
        self.scan_root(|_, raw| {
            if dir_entry::is_listed(raw)
                && files.try_push(FileInfo::from(&DirEntry83::parse(raw))).is_err()
            {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })?;
        Ok(files)
    }

    pub fn get_file_count(&mut self) -> Result<usize, FsError> {
        let mut count = 0;
        self.scan_root(|_, raw| {
            if dir_entry::is_listed(raw) {
                count += 1;
            }
            ControlFlow::<()>::Continue(())
        })?;
        Ok(count)
    }
}
