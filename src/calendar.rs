//! Proleptic Gregorian calendar arithmetic.
//!
//! Days are counted from 1970-01-01 (day 0). The conversion shifts the year so that it starts on
//! March 1, which moves the leap day to the end of the computational year, and then splits the
//! year into a 400-year cycle and a year of that cycle.

use crate::consts::{
    DAYS_IN_MONTH, DAYS_PER_CYCLE, FEBRUARY, FEBRUARY_DAYS_LEAP, MICROS_PER_DAY, MICROS_PER_HOUR,
    MICROS_PER_MINUTE, MICROS_PER_SECOND, UNIX_EPOCH_SHIFT,
};
use crate::{Error, Result};

const CYCLE: i64 = DAYS_PER_CYCLE as i64;

/// English month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Gregorian leap year rule.
///
/// `y % 16 == 0` stands in for `y % 400 == 0` once `y` is known to be a multiple of 100.
pub const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 16 == 0 || year % 25 != 0)
}

/// Last day of `month` (1-based). Without a year, February has 28 days.
pub const fn last_day_of_month(month: u8, year: Option<i32>) -> u8 {
    debug_assert!(month != 0 && month <= 12);

    match year {
        Some(year) if month == FEBRUARY && is_leap_year(year) => FEBRUARY_DAYS_LEAP,
        _ => DAYS_IN_MONTH[month as usize],
    }
}

/// Days from 1970-01-01 to the given civil date.
pub const fn days_from_civil(year: i32, month: u8, day: u8) -> i64 {
    let year = if month <= FEBRUARY { year as i64 - 1 } else { year as i64 };
    let cd = if year >= 0 { year } else { year - 399 } / 400;
    let year_of_cycle = year - cd * 400; // [0, 399]
    let shifted_month = if month > FEBRUARY { month as i64 - 3 } else { month as i64 + 9 }; // March = 0
    let day_of_year = (153 * shifted_month + 2) / 5 + day as i64 - 1; // [0, 365]
    let day_of_cycle = year_of_cycle * 365 + year_of_cycle / 4 - year_of_cycle / 100 + day_of_year; // [0, 146096]
    cd * CYCLE + day_of_cycle - UNIX_EPOCH_SHIFT
}

/// Civil date of the given day count. Inverse of [`days_from_civil`].
pub const fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let days = days + UNIX_EPOCH_SHIFT;
    let cd = if days >= 0 { days } else { days - (CYCLE - 1) } / CYCLE;
    let day_of_cycle = days - cd * CYCLE; // [0, 146096]
    let year_of_cycle = (day_of_cycle - day_of_cycle / 1460 + day_of_cycle / 36524 - day_of_cycle / (CYCLE - 1)) / 365; // [0, 399]
    let day_of_year = day_of_cycle - (365 * year_of_cycle + year_of_cycle / 4 - year_of_cycle / 100); // [0, 365]
    let shifted_month = (5 * day_of_year + 2) / 153; // [0, 11]
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1; // [1, 31]
    let month = if shifted_month < 10 { shifted_month + 3 } else { shifted_month - 9 }; // [1, 12]
    let year = year_of_cycle + cd * 400 + if month <= 2 { 1 } else { 0 };
    (year as i32, month as u8, day as u8)
}

/// Broken-down UTC fields of a Unix instant. The year is not range checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Civil {
    pub year:   i32,
    pub month:  u8,
    pub day:    u8,
    pub hour:   u8,
    pub minute: u8,
    pub second: u8,
    pub micro:  u32,
}

impl Civil {
    pub const fn from_unix_micros(micros: i64) -> Self {
        let days = micros.div_euclid(MICROS_PER_DAY as i64);
        let of_day = micros.rem_euclid(MICROS_PER_DAY as i64) as u64;
        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            hour: (of_day / MICROS_PER_HOUR) as u8,
            minute: (of_day % MICROS_PER_HOUR / MICROS_PER_MINUTE) as u8,
            second: (of_day % MICROS_PER_MINUTE / MICROS_PER_SECOND) as u8,
            micro: (of_day % MICROS_PER_SECOND) as u32,
        }
    }
}

/// Converts a Unix time given in some unit (`micros_per_unit` microseconds each) to whole
/// microseconds, rounding to the nearest.
pub(crate) fn unix_micros_from_f64(value: f64, micros_per_unit: f64) -> Result<i64> {
    // i64::MAX is not representable; 2^63 is the first float above every valid value
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    let micros = (value * micros_per_unit).round();
    if !micros.is_finite() || micros >= LIMIT || micros < -LIMIT {
        return Err(Error::AtMost {
            what: "unix time",
            max:  "2^63 microseconds",
        });
    }
    Ok(micros as i64)
}
