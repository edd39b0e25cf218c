//! FAT16 directory entry structure and operations

use super::constants::*;
use super::date::FatTimestamp;
use super::name::ShortName;
use crate::constants::volume::DIR_ENTRY_SIZE;
use bitflags::bitflags;

bitflags! {
    /// File attributes (read-only, directory, etc)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirAttributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
        const _ = !0;
    }
}

/// 8.3 format directory entry (32 bytes on disk)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry83 {
    /// Space-padded name and extension
    pub name: ShortName,

    pub attributes: DirAttributes,

    /// Reserved byte (case flags on some systems)
    pub reserved: u8,

    /// Creation time, tenths of a second
    pub create_time_tenth: u8,

    pub created: FatTimestamp,

    pub last_access_date: u16,

    /// High word of the first cluster, always 0 on FAT16
    pub start_cluster_hi: u16,

    pub modified: FatTimestamp,

    /// First cluster number
    pub start_cluster: u16,

    /// File size in bytes
    pub file_size: u32,
}

impl DirEntry83 {
    /// Creates a new archive file entry
    pub fn new_file(
        name: ShortName,
        start_cluster: u16,
        file_size: u32,
        created: FatTimestamp,
        modified: FatTimestamp,
    ) -> Self {
        Self {
            name,
            attributes: DirAttributes::ARCHIVE,
            reserved: 0,
            create_time_tenth: 0,
            created,
            last_access_date: modified.date,
            start_cluster_hi: 0,
            modified,
            start_cluster,
            file_size,
        }
    }

    /// Decodes one 32-byte on-disk record
    pub fn parse(raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= DIR_ENTRY_SIZE);
        let le16 = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);

        let mut name = [0u8; SHORT_NAME_LEN];
        name.copy_from_slice(&raw[..SHORT_NAME_LEN]);

        Self {
            name: ShortName::from_raw(name),
            attributes: DirAttributes::from_bits_retain(raw[11]),
            reserved: raw[12],
            create_time_tenth: raw[13],
            created: FatTimestamp::from_raw(le16(16), le16(14)),
            last_access_date: le16(18),
            start_cluster_hi: le16(20),
            modified: FatTimestamp::from_raw(le16(24), le16(22)),
            start_cluster: le16(26),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    /// Encodes into a 32-byte on-disk record
    pub fn write_to(&self, raw: &mut [u8]) {
        debug_assert!(raw.len() >= DIR_ENTRY_SIZE);
        raw[..SHORT_NAME_LEN].copy_from_slice(self.name.as_bytes());
        raw[11] = self.attributes.bits();
        raw[12] = self.reserved;
        raw[13] = self.create_time_tenth;
        raw[14..16].copy_from_slice(&self.created.time.to_le_bytes());
        raw[16..18].copy_from_slice(&self.created.date.to_le_bytes());
        raw[18..20].copy_from_slice(&self.last_access_date.to_le_bytes());
        raw[20..22].copy_from_slice(&self.start_cluster_hi.to_le_bytes());
        raw[22..24].copy_from_slice(&self.modified.time.to_le_bytes());
        raw[24..26].copy_from_slice(&self.modified.date.to_le_bytes());
        raw[26..28].copy_from_slice(&self.start_cluster.to_le_bytes());
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
    }
}

/// Returns true if the raw record is marked as deleted
pub fn is_deleted(raw: &[u8]) -> bool {
    raw[0] == DELETED_ENTRY_MARKER
}

/// Returns true if the raw record terminates the directory
pub fn is_end(raw: &[u8]) -> bool {
    raw[0] == END_OF_DIR_MARKER
}

/// Returns true if the raw record can take a new entry
pub fn is_reusable(raw: &[u8]) -> bool {
    is_end(raw) || is_deleted(raw)
}

/// Returns true if the raw record is a live entry visible to file
/// enumeration (not deleted, not a volume label or long-name fragment)
pub fn is_listed(raw: &[u8]) -> bool {
    !is_reusable(raw) && !DirAttributes::from_bits_retain(raw[11]).contains(DirAttributes::VOLUME_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_of_encoded_entry() {
        let stamp = FatTimestamp::VOLUME_CREATED;
        let entry = DirEntry83::new_file(ShortName::new("log.txt"), 0x0203, 5000, stamp, stamp);

        let mut raw = [0u8; DIR_ENTRY_SIZE];
        entry.write_to(&mut raw);

        assert_eq!(&raw[..11], b"LOG     TXT");
        assert_eq!(raw[11], 0x20);
        assert_eq!(&raw[26..28], &[0x03, 0x02]);
        assert_eq!(u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]), 5000);
        assert_eq!(u16::from_le_bytes([raw[24], raw[25]]), stamp.date);
        assert_eq!(DirEntry83::parse(&raw), entry);
    }

    #[test]
    fn test_slot_markers() {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        assert!(is_end(&raw));
        assert!(is_reusable(&raw));
        assert!(!is_listed(&raw));

        raw[..11].copy_from_slice(b"DATA    BIN");
        assert!(is_listed(&raw));

        raw[0] = DELETED_ENTRY_MARKER;
        assert!(is_deleted(&raw));
        assert!(!is_listed(&raw));
    }

    #[test]
    fn test_volume_label_and_long_names_are_not_listed() {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[..11].copy_from_slice(b"STORAGE    ");
        raw[11] = DirAttributes::VOLUME_ID.bits();
        assert!(!is_listed(&raw));

        // long file name fragment: RO | HIDDEN | SYSTEM | VOLUME_ID
        raw[0] = b'A';
        raw[11] = 0x0F;
        assert!(!is_listed(&raw));
    }
}
