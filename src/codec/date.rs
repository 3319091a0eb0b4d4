//! Dates packed as the decimal digits `MMDDYYYY` of a 24-bit big-endian integer.

use byteorder::{BigEndian, ByteOrder};
use chrono::NaiveDate;
use std::fmt::{Display, Formatter};

pub const PACKED_DATE_LEN: usize = 3;
pub const MIN_YEAR: u16 = 1900;
pub const MAX_YEAR: u16 = 2100;
const MAX_PACKED_VALUE: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackedDate {
    Valid { day: u8, month: u8, year: u16 },
    /// The bytes do not resolve to a calendar date, kept for display
    Undecodable { raw: [u8; PACKED_DATE_LEN] },
}

impl PackedDate {
    pub fn decode(bytes: [u8; PACKED_DATE_LEN]) -> Self {
        let value = BigEndian::read_u24(&bytes);
        let month = value / 1_000_000;
        let day = (value / 10_000) % 100;
        let year = value % 10_000;

        let in_range = (u32::from(MIN_YEAR)..=u32::from(MAX_YEAR)).contains(&year);
        if in_range && NaiveDate::from_ymd_opt(year as i32, month, day).is_some() {
            PackedDate::Valid {
                day: day as u8,
                month: month as u8,
                year: year as u16,
            }
        } else {
            PackedDate::Undecodable { raw: bytes }
        }
    }

    /// Decodes a slice that has to be exactly [`PACKED_DATE_LEN`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let mut raw = [0u8; PACKED_DATE_LEN];
        if bytes.len() != raw.len() {
            return None;
        }
        raw.copy_from_slice(bytes);
        Some(Self::decode(raw))
    }

    /// Packs a date, `None` if it is not a valid date within the supported years.
    pub fn encode(day: u8, month: u8, year: u16) -> Option<[u8; PACKED_DATE_LEN]> {
        let value = u32::from(month) * 1_000_000 + u32::from(day) * 10_000 + u32::from(year);
        if value > MAX_PACKED_VALUE {
            return None;
        }
        let mut bytes = [0u8; PACKED_DATE_LEN];
        BigEndian::write_u24(&mut bytes, value);
        match Self::decode(bytes) {
            PackedDate::Valid { .. } => Some(bytes),
            PackedDate::Undecodable { .. } => None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, PackedDate::Valid { .. })
    }
}

impl Display for PackedDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PackedDate::Valid { day, month, year } => {
                write!(f, "{day:02}-{month:02}-{year:04}")
            }
            PackedDate::Undecodable { raw } => write!(f, "0x{}", hex::encode_upper(raw)),
        }
    }
}
