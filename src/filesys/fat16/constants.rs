//! FAT16 on-disk format constants

/// Size of FAT entry in bytes (16-bit)
pub const FAT_ENTRY_SIZE: usize = 2;

/// Length of the space-padded 8.3 name field
pub const SHORT_NAME_LEN: usize = 11;

/// Maximum length of filename excluding extension
pub const MAX_FILENAME_LENGTH: usize = 8;

/// Maximum length of file extension
pub const MAX_EXTENSION_LENGTH: usize = 3;

/// Marker for deleted directory entries
pub const DELETED_ENTRY_MARKER: u8 = 0xE5;

/// First name byte of the slot terminating the in-use directory region
pub const END_OF_DIR_MARKER: u8 = 0x00;

/// FAT value of an unallocated cluster
pub const FAT_FREE: u16 = 0x0000;

/// FAT value of a cluster marked bad
pub const FAT_BAD_CLUSTER: u16 = 0xFFF7;

/// Lowest FAT value meaning end of chain
pub const FAT_END_OF_CHAIN_MIN: u16 = 0xFFF8;

/// End of chain value written by the allocator
pub const FAT_END_OF_CHAIN: u16 = 0xFFFF;

/// Media descriptor (fixed disk)
pub const MEDIA_DESCRIPTOR: u8 = 0xF8;

/// Offset of the end-of-sector signature in the boot sector
pub const BOOT_SIGNATURE_OFFSET: usize = 510;

pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// Extended boot record signature
pub const EXTENDED_BOOT_SIGNATURE: u8 = 0x29;

pub const OEM_NAME: [u8; 8] = *b"MSWIN4.1";

pub const VOLUME_LABEL: [u8; 11] = *b"STORAGE    ";

pub const FS_TYPE: [u8; 8] = *b"FAT16   ";
