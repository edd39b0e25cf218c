//! FAT16 Boot Sector Structure
//!
//! The boot sector is never read back from flash for geometry: it is
//! synthesized from compile-time constants whenever the host asks for it.
//! Only its end-of-sector signature is persisted, as the "formatted" mark.

use super::constants::*;
use super::date::FatTimestamp;
use crate::constants::volume::*;

/// Represents the boot sector of a FAT16 filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSector {
    /// Jump instruction to boot code
    pub jump_boot: [u8; 3],

    /// Name of the system that formatted the volume
    pub oem_name: [u8; 8],

    /// Number of bytes per sector
    pub bytes_per_sector: u16,

    /// Number of sectors per cluster
    pub sectors_per_cluster: u8,

    /// Number of reserved sectors at start of volume
    /// Including the boot sector
    pub reserved_sectors: u16,

    /// Number of FAT copies
    pub fat_count: u8,

    /// Maximum number of root directory entries
    pub root_dir_entries: u16,

    /// Total number of sectors (16-bit)
    pub total_sectors_16: u16,

    /// Media type descriptor
    pub media_type: u8,

    /// Size of each FAT copy in sectors
    pub sectors_per_fat: u16,

    /// Sectors per track for interrupt 0x13
    pub sectors_per_track: u16,

    /// Number of heads for interrupt 0x13
    pub head_count: u16,

    /// Number of hidden sectors preceding the partition
    pub hidden_sectors: u32,

    /// Total number of sectors (32-bit), unused below 65536 sectors
    pub total_sectors_32: u32,

    /// INT 13h drive number
    pub drive_number: u8,

    /// Reserved byte
    pub reserved1: u8,

    /// Extended boot signature
    pub boot_signature: u8,

    /// Volume serial number
    pub volume_id: u32,

    /// Volume label
    pub volume_label: [u8; 11],

    /// Filesystem type string
    pub fs_type: [u8; 8],
}

impl BootSector {
    /// The boot sector describing this volume's fixed geometry
    pub const fn volume() -> Self {
        Self {
            jump_boot: [0xEB, 0x3C, 0x90],
            oem_name: OEM_NAME,
            bytes_per_sector: SECTOR_SIZE as u16,
            sectors_per_cluster: SECTORS_PER_CLUSTER as u8,
            reserved_sectors: RESERVED_SECTORS as u16,
            fat_count: FAT_COPIES as u8,
            root_dir_entries: ROOT_DIR_ENTRIES as u16,
            total_sectors_16: TOTAL_SECTORS as u16,
            media_type: MEDIA_DESCRIPTOR,
            sectors_per_fat: SECTORS_PER_FAT as u16,
            sectors_per_track: 63,
            head_count: 255,
            hidden_sectors: 0,
            total_sectors_32: 0,
            drive_number: 0x80,
            reserved1: 0,
            boot_signature: EXTENDED_BOOT_SIGNATURE,
            volume_id: FatTimestamp::VOLUME_CREATED.volume_id(),
            volume_label: VOLUME_LABEL,
            fs_type: FS_TYPE,
        }
    }

    /// Serializes into a full sector: BPB fields little-endian, zeroed boot
    /// code, 0x55AA signature.
    pub fn write_to(&self, buf: &mut [u8; SECTOR_SIZE]) {
        buf.fill(0);
        buf[0..3].copy_from_slice(&self.jump_boot);
        buf[3..11].copy_from_slice(&self.oem_name);
        buf[11..13].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        buf[13] = self.sectors_per_cluster;
        buf[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        buf[16] = self.fat_count;
        buf[17..19].copy_from_slice(&self.root_dir_entries.to_le_bytes());
        buf[19..21].copy_from_slice(&self.total_sectors_16.to_le_bytes());
        buf[21] = self.media_type;
        buf[22..24].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        buf[24..26].copy_from_slice(&self.sectors_per_track.to_le_bytes());
        buf[26..28].copy_from_slice(&self.head_count.to_le_bytes());
        buf[28..32].copy_from_slice(&self.hidden_sectors.to_le_bytes());
        buf[32..36].copy_from_slice(&self.total_sectors_32.to_le_bytes());
        buf[36] = self.drive_number;
        buf[37] = self.reserved1;
        buf[38] = self.boot_signature;
        buf[39..43].copy_from_slice(&self.volume_id.to_le_bytes());
        buf[43..54].copy_from_slice(&self.volume_label);
        buf[54..62].copy_from_slice(&self.fs_type);
        buf[BOOT_SIGNATURE_OFFSET..].copy_from_slice(&BOOT_SIGNATURE);
    }
}

/// Whether `sector` ends with the 0x55AA boot signature
pub fn has_signature(sector: &[u8; SECTOR_SIZE]) -> bool {
    sector[BOOT_SIGNATURE_OFFSET..] == BOOT_SIGNATURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bpb_field_offsets() {
        let mut buf = [0xAAu8; SECTOR_SIZE];
        BootSector::volume().write_to(&mut buf);

        assert_eq!(&buf[0..3], &[0xEB, 0x3C, 0x90]);
        assert_eq!(&buf[3..11], b"MSWIN4.1");
        assert_eq!(u16::from_le_bytes([buf[11], buf[12]]), 512);
        assert_eq!(buf[13], 8);
        assert_eq!(u16::from_le_bytes([buf[14], buf[15]]), 1);
        assert_eq!(buf[16], 2);
        assert_eq!(u16::from_le_bytes([buf[17], buf[18]]), 512);
        assert_eq!(u16::from_le_bytes([buf[19], buf[20]]) as u32, TOTAL_SECTORS);
        assert_eq!(buf[21], 0xF8);
        assert_eq!(u16::from_le_bytes([buf[22], buf[23]]), 8);
        assert_eq!(buf[38], 0x29);
        assert_eq!(&buf[43..54], b"STORAGE    ");
        assert_eq!(&buf[54..62], b"FAT16   ");
    }

    #[test]
    fn test_geometry_matches_layout() {
        let bs = BootSector::volume();
        let root_start = bs.reserved_sectors as u32 + bs.fat_count as u32 * bs.sectors_per_fat as u32;
        let data_start = root_start + bs.root_dir_entries as u32 * 32 / bs.bytes_per_sector as u32;

        assert_eq!(root_start, ROOT_START_SECTOR);
        assert_eq!(data_start, DATA_START_SECTOR);
    }

    #[test]
    fn test_boot_code_zeroed_and_signed() {
        let mut buf = [0xAAu8; SECTOR_SIZE];
        BootSector::volume().write_to(&mut buf);

        assert!(buf[62..BOOT_SIGNATURE_OFFSET].iter().all(|&b| b == 0));
        assert!(has_signature(&buf));
        assert!(!has_signature(&[0xFF; SECTOR_SIZE]));
    }
}
