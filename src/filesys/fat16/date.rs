//! DOS date and time stamps as stored in directory entries.
//!
//! Date: bits 15-9 years since 1980, 8-5 month, 4-0 day.
//! Time: bits 15-11 hours, 10-5 minutes, 4-0 seconds / 2.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FatTimestamp {
    /// Packed DOS date
    pub date: u16,
    /// Packed DOS time
    pub time: u16,
}

impl FatTimestamp {
    pub const MIN_YEAR: u16 = 1980;
    pub const MAX_YEAR: u16 = 2107;

    /// Stamp of volume creation, also the default for new files
    pub const VOLUME_CREATED: Self = match Self::new(2026, 1, 2, 12, 0, 0) {
        Some(stamp) => stamp,
        None => panic!("invalid volume creation stamp"),
    };

    /// Packs a calendar date and wall-clock time, or `None` if any field is
    /// out of range. Seconds are stored with two-second resolution.
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        if year < Self::MIN_YEAR
            || year > Self::MAX_YEAR
            || month < 1
            || month > 12
            || day < 1
            || day > 31
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }

        let date = ((year - Self::MIN_YEAR) << 9) | ((month as u16) << 5) | day as u16;
        let time = ((hour as u16) << 11) | ((minute as u16) << 5) | (second as u16 / 2);
        Some(Self { date, time })
    }

    pub const fn from_raw(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    pub const fn year(self) -> u16 {
        (self.date >> 9) + Self::MIN_YEAR
    }

    pub const fn month(self) -> u8 {
        ((self.date >> 5) & 0xF) as u8
    }

    pub const fn day(self) -> u8 {
        (self.date & 0x1F) as u8
    }

    pub const fn hour(self) -> u8 {
        (self.time >> 11) as u8
    }

    pub const fn minute(self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    pub const fn second(self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }

    /// Volume serial number derived from this stamp
    pub const fn volume_id(self) -> u32 {
        ((self.date as u32) << 16) | self.time as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_stamp_encoding() {
        let stamp = FatTimestamp::VOLUME_CREATED;
        assert_eq!(stamp.date, 0x5C22);
        assert_eq!(stamp.time, 0x6000);
        assert_eq!(stamp.volume_id(), 0x5C22_6000);
    }

    #[test]
    fn test_fields_decode() {
        let stamp = FatTimestamp::new(2031, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(stamp.year(), 2031);
        assert_eq!(stamp.month(), 12);
        assert_eq!(stamp.day(), 31);
        assert_eq!(stamp.hour(), 23);
        assert_eq!(stamp.minute(), 59);
        // two-second resolution
        assert_eq!(stamp.second(), 58);
    }

    #[test]
    fn test_out_of_range_fields() {
        assert!(FatTimestamp::new(1979, 1, 1, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2000, 13, 1, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2000, 1, 0, 0, 0, 0).is_none());
        assert!(FatTimestamp::new(2000, 1, 1, 24, 0, 0).is_none());
    }
}
