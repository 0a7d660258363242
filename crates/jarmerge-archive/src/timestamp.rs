//! Entry timestamps on the wire.
//!
//! ZIP stores a DOS modification time (two-second resolution, 1980–2107, no
//! time zone) in every header. Access and creation times only survive in the
//! extended timestamp extra field:
//!
//! ```text
//! [2 bytes: header id 0x5455, little-endian]
//! [2 bytes: data size, little-endian]
//! [1 byte:  flags (bit 0 mtime, bit 1 atime, bit 2 ctime)]
//! [4 bytes per flagged time: signed unix seconds, little-endian]
//! ```
//!
//! DOS times are interpreted as UTC.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use jarmerge_types::EntryTimes;

/// Header id of the extended timestamp extra field ("UT").
pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

const FLAG_MTIME: u8 = 0b001;
const FLAG_ATIME: u8 = 0b010;
const FLAG_CTIME: u8 = 0b100;

/// Convert a DOS timestamp read from an entry header.
pub fn from_dos(dos: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(dos.year().into(), dos.month().into(), dos.day().into())?
        .and_hms_opt(dos.hour().into(), dos.minute().into(), dos.second().into())
        .map(|naive| naive.and_utc())
}

/// Convert to a DOS timestamp, falling back to the DOS epoch when the instant
/// is absent or outside the representable range.
pub fn to_dos(at: Option<DateTime<Utc>>) -> zip::DateTime {
    at.and_then(|at| {
        let year = u16::try_from(at.year()).ok()?;
        zip::DateTime::from_date_and_time(
            year,
            at.month() as u8,
            at.day() as u8,
            at.hour() as u8,
            at.minute() as u8,
            at.second() as u8,
        )
        .ok()
    })
    .unwrap_or_default()
}

/// Extract the times carried by an entry: the DOS modification time,
/// overridden by whatever the extended timestamp field provides.
pub fn decode_times(dos: zip::DateTime, extra: &[u8]) -> EntryTimes {
    let mut times = EntryTimes {
        modified: from_dos(dos),
        ..EntryTimes::none()
    };

    if let Some(data) = find_extra_field(extra, EXTENDED_TIMESTAMP_ID) {
        let Some((&flags, mut rest)) = data.split_first() else {
            return times;
        };
        let mut next = |flag: u8| -> Option<DateTime<Utc>> {
            if flags & flag == 0 || rest.len() < 4 {
                return None;
            }
            let (secs, tail) = rest.split_at(4);
            rest = tail;
            let secs = i32::from_le_bytes([secs[0], secs[1], secs[2], secs[3]]);
            DateTime::from_timestamp(secs.into(), 0)
        };
        if let Some(mtime) = next(FLAG_MTIME) {
            times.modified = Some(mtime);
        }
        times.accessed = next(FLAG_ATIME);
        times.created = next(FLAG_CTIME);
    }

    times
}

/// Encode the extended timestamp field for `times`.
///
/// Returns `None` when there is nothing representable to encode. Instants
/// outside the signed 32-bit range are left out.
pub fn encode_extended(times: &EntryTimes) -> Option<Vec<u8>> {
    let mut flags = 0u8;
    let mut payload = Vec::with_capacity(12);
    for (flag, at) in [
        (FLAG_MTIME, times.modified),
        (FLAG_ATIME, times.accessed),
        (FLAG_CTIME, times.created),
    ] {
        if let Some(secs) = at.and_then(|at| i32::try_from(at.timestamp()).ok()) {
            flags |= flag;
            payload.extend_from_slice(&secs.to_le_bytes());
        }
    }
    if flags == 0 {
        return None;
    }

    let size = 1 + payload.len() as u16;
    let mut field = Vec::with_capacity(4 + usize::from(size));
    field.extend_from_slice(&EXTENDED_TIMESTAMP_ID.to_le_bytes());
    field.extend_from_slice(&size.to_le_bytes());
    field.push(flags);
    field.extend_from_slice(&payload);
    Some(field)
}

/// Locate the data of one extra field block by header id.
fn find_extra_field(extra: &[u8], id: u16) -> Option<&[u8]> {
    let mut rest = extra;
    while rest.len() >= 4 {
        let header = u16::from_le_bytes([rest[0], rest[1]]);
        let size = usize::from(u16::from_le_bytes([rest[2], rest[3]]));
        let body = rest.get(4..4 + size)?;
        if header == id {
            return Some(body);
        }
        rest = &rest[4 + size..];
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn dos_roundtrip_even_seconds() {
        let instant = Utc.with_ymd_and_hms(2021, 6, 15, 12, 30, 42).unwrap();
        assert_eq!(from_dos(to_dos(Some(instant))), Some(instant));
    }

    #[test]
    fn dos_out_of_range_falls_back_to_epoch() {
        let before = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(from_dos(to_dos(Some(before))), Some(EntryTimes::epoch()));
        assert_eq!(from_dos(to_dos(None)), Some(EntryTimes::epoch()));
    }

    #[test]
    fn extended_field_roundtrip() {
        let times = EntryTimes {
            modified: Some(at(1_600_000_001)),
            accessed: Some(at(1_600_000_002)),
            created: Some(at(1_600_000_003)),
        };
        let field = encode_extended(&times).unwrap();
        assert_eq!(field.len(), 4 + 1 + 12);
        assert_eq!(decode_times(zip::DateTime::default(), &field), times);
    }

    #[test]
    fn extended_field_with_only_mtime() {
        let times = EntryTimes {
            modified: Some(at(1_000)),
            ..EntryTimes::none()
        };
        let field = encode_extended(&times).unwrap();
        assert_eq!(field[4], FLAG_MTIME);
        assert_eq!(decode_times(zip::DateTime::default(), &field), times);
    }

    #[test]
    fn nothing_to_encode() {
        assert!(encode_extended(&EntryTimes::none()).is_none());
    }

    #[test]
    fn central_directory_field_may_be_truncated() {
        // Central headers carry only the mtime even when the flags say more.
        let field = [0x55, 0x54, 5, 0, 0b111, 0x10, 0, 0, 0];
        let times = decode_times(zip::DateTime::default(), &field);
        assert_eq!(times.modified, Some(at(16)));
        assert_eq!(times.accessed, None);
        assert_eq!(times.created, None);
    }

    #[test]
    fn unrelated_extra_fields_are_skipped() {
        let mut extra = vec![0x34, 0x12, 2, 0, 0xAA, 0xBB];
        extra.extend(encode_extended(&EntryTimes::uniform(at(77))).unwrap());
        let times = decode_times(zip::DateTime::default(), &extra);
        assert_eq!(times, EntryTimes::uniform(at(77)));
    }

    #[test]
    fn malformed_extra_is_ignored() {
        let times = decode_times(zip::DateTime::default(), &[0x55, 0x54, 40, 0, 1]);
        assert_eq!(times.modified, Some(EntryTimes::epoch()));
    }
}
