//! Conversions from source-native time formats into the canonical event
//! timestamp: microseconds since the Unix epoch, UTC.

use jiff::civil::DateTime;
use jiff::tz::Offset;
use log::warn;

const WINDOWS_TO_UNIX_MICROS: i64 = 11_644_473_600_000_000;
const MICROS_PER_SECOND: i64 = 1_000_000;

/// Converts a FAT date time into epoch microseconds.
///
/// The 32-bit value packs two words: the low word is the date (bits 0-4 day,
/// 5-8 month, 9-15 years since 1980), the high word is the wall time (bits
/// 0-4 seconds in two second steps, 5-10 minutes, 11-15 hours). Values that
/// do not name a valid calendar date or wall time normalize to 0.
pub fn from_fat_date_time(fat_date_time: u32) -> i64 {
    let date = fat_date_time & 0xffff;
    let time = fat_date_time >> 16;

    let day = (date & 0x1f) as i8;
    let month = ((date >> 5) & 0x0f) as i8;
    let year = 1980i16 + ((date >> 9) & 0x7f) as i16;

    let second = ((time & 0x1f) * 2) as i8;
    let minute = ((time >> 5) & 0x3f) as i8;
    let hour = ((time >> 11) & 0x1f) as i8;

    let Ok(dt) = DateTime::new(year, month, day, hour, minute, second, 0) else {
        warn!("invalid FAT date time {fat_date_time:#010x}; normalizing to 0");
        return 0;
    };

    match Offset::UTC.to_timestamp(dt) {
        Ok(ts) => ts.as_microsecond(),
        Err(_) => {
            warn!("FAT date time {fat_date_time:#010x} is out of range; normalizing to 0");
            0
        }
    }
}

/// Converts a FILETIME (100ns ticks since 1601-01-01 00:00:00 UTC) into
/// epoch microseconds.
pub fn from_filetime(filetime: u64) -> i64 {
    (filetime / 10) as i64 - WINDOWS_TO_UNIX_MICROS
}

/// Converts POSIX seconds into epoch microseconds.
pub fn from_posix_time(posix_time: i64) -> i64 {
    posix_time.saturating_mul(MICROS_PER_SECOND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_posix_seconds_scale_to_microseconds() {
        assert_eq!(from_posix_time(0), 0);
        assert_eq!(from_posix_time(1), 1_000_000);
        assert_eq!(from_posix_time(-1), -1_000_000);
        assert_eq!(from_posix_time(1_281_647_192), 1_281_647_192_000_000);
    }

    #[test]
    fn test_filetime_epoch_offsets() {
        // 1970-01-01 00:00:00 UTC expressed as FILETIME.
        assert_eq!(from_filetime(116_444_736_000_000_000), 0);
        // 2007-02-22 17:00:00.306162 UTC.
        assert_eq!(from_filetime(128_166_372_003_061_629), 1_172_163_600_306_162);
        // The Windows epoch itself lands before the Unix epoch.
        assert_eq!(from_filetime(0), -11_644_473_600_000_000);
    }

    #[test]
    fn test_fat_date_time_packs_both_words() {
        // 2010-08-12 21:06:32 UTC: date word 0x3d0c, time word 0xa8d0.
        assert_eq!(from_fat_date_time(0xa8d0_3d0c), 1_281_647_192_000_000);
    }

    #[test]
    fn test_fat_date_time_midnight_time_word_zero() {
        // 1980-01-01 00:00:00 UTC, the FAT epoch.
        let fat = (0 << 9) | (1 << 5) | 1;
        assert_eq!(from_fat_date_time(fat), 315_532_800_000_000);
    }

    #[test]
    fn test_invalid_fat_fields_normalize_to_zero() {
        // Day and month zero.
        assert_eq!(from_fat_date_time(0), 0);
        // Month 13.
        let bad_month = (30 << 9) | (13 << 5) | 5;
        assert_eq!(from_fat_date_time(bad_month), 0);
        // Hour 24 in the time word.
        let bad_hour = ((24 << 11) as u32) << 16 | ((30 << 9) | (8 << 5) | 12);
        assert_eq!(from_fat_date_time(bad_hour), 0);
    }
}
