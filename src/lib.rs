//! Fixed-point calendar, time and duration values.
//!
//! Every value owns a small byte array with its fields at fixed offsets, converts to and from
//! Unix time, parses strict or lenient ISO 8601-like text and packs into a dense big-endian bit
//! format with [`BitPacked`].
//!
//! Two kinds of duration are provided: [`DurationExact`] counts fixed units only, [`Duration`]
//! also carries years and months, whose length depends on the date they are applied to.

mod bits;
mod calendar;
mod cell;
mod clock;
mod consts;
mod cursor;
mod date;
mod datetime;
mod duration;
mod error;
mod exact;
mod grammar;
mod prelude;
mod time;
mod types;

pub use bits::{BitPacked, BitReader, BitWriter};
pub use calendar::{Civil, MONTH_NAMES, civil_from_days, days_from_civil, is_leap_year, last_day_of_month};
pub use clock::{Clock, FixedClock, SystemClock};
pub use consts::*;
pub use date::DateOnly;
pub use datetime::{DateTime, DateTimeLocal, DateTimeUtc, Local, Utc, Zone};
pub use duration::{Duration, DurationParts};
pub use error::{Error, ErrorKind, Result};
pub use exact::DurationExact;
pub use grammar::{Grammar, ParseMode};
pub use time::{TimeOnly, TimeOnlyMs};
pub use types::{Day, Hour, Microsecond, Millisecond, Minute, Month, Second, Year};

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::{DateOnly, DateTimeUtc};

    pub fn date(year: i32, month: u8, day: u8) -> DateOnly {
        DateOnly::new(year, month, day).unwrap()
    }

    pub fn utc(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8, micro: u32) -> DateTimeUtc {
        DateTimeUtc::new(year, month, day, hour, minute, second, micro).unwrap()
    }
}
