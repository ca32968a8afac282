//! Calendar dates.
//!
//! Cell layout: year at bytes 0..2, month at 2, day at 3. Big-endian storage makes the derived
//! ordering chronological.

use std::fmt;
use std::str::FromStr;

use crate::bits::{BitPacked, BitReader, BitWriter};
use crate::calendar::{Civil, civil_from_days, days_from_civil, last_day_of_month, unix_micros_from_f64};
use crate::clock::{Clock, SystemClock};
use crate::consts::{
    ALT_DATE_SEPARATORS, DATE_SEPARATOR, MAX_UNIX_DAYS, MICROS_PER_DAY, MICROS_PER_MILLI,
    MICROS_PER_SECOND, MIN_UNIX_DAYS, MONTHS_PER_YEAR,
};
use crate::cursor::Cursor;
use crate::grammar::{self, Grammar, ParseMode};
use crate::prelude::text_serde;
use crate::types::{Component, Day, Month, Year};
use crate::{Error, Result};

const YEAR_AT: usize = 0;
const MONTH_AT: usize = 2;
const DAY_AT: usize = 3;

/// A proleptic Gregorian date between -10000-01-01 and 22767-12-31.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateOnly([u8; 4]);

impl DateOnly {
    const NAME: &'static str = "date";
    pub(crate) const STORAGE: usize = 4;

    /// Creates a date, validating each field and the day against its month.
    ///
    /// # Errors
    /// `Error::OutOfRange` for a year or month out of range, `Error::InvalidDay` for a day the
    /// month does not have.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self> {
        let year = Year::new(year)?;
        let month = Month::new(month)?;
        let day = Day::new(day)?;
        Self::from_parts(year, month, day)
    }

    /// Combines validated components, checking the day against the month.
    pub fn from_parts(year: Year, month: Month, day: Day) -> Result<Self> {
        Day::for_month(day.get(), year.get(), month.get())?;
        Ok(Self::from_parts_unchecked(year, month, day))
    }

    fn from_parts_unchecked(year: Year, month: Month, day: Day) -> Self {
        let mut cell = [0; 4];
        year.store(&mut cell[YEAR_AT..]);
        month.store(&mut cell[MONTH_AT..]);
        day.store(&mut cell[DAY_AT..]);
        Self(cell)
    }

    pub fn year(&self) -> Year {
        Year::load(&self.0[YEAR_AT..])
    }

    pub fn month(&self) -> Month {
        Month::load(&self.0[MONTH_AT..])
    }

    pub fn day(&self) -> Day {
        Day::load(&self.0[DAY_AT..])
    }

    /// Days since 1970-01-01.
    pub fn to_unix_days(&self) -> i64 {
        days_from_civil(self.year().get(), self.month().get(), self.day().get())
    }

    /// # Errors
    /// Returns `Error::OutOfRange` outside `MIN_UNIX_DAYS..=MAX_UNIX_DAYS`.
    pub fn from_unix_days(days: i64) -> Result<Self> {
        if !(MIN_UNIX_DAYS..=MAX_UNIX_DAYS).contains(&days) {
            return Err(Error::out_of_range("unix days", days, MIN_UNIX_DAYS, MAX_UNIX_DAYS));
        }
        let (year, month, day) = civil_from_days(days);
        Self::new(year, month, day)
    }

    /// Midnight UTC as Unix seconds.
    pub fn to_unix_seconds(&self) -> i64 {
        self.to_unix_micros() / MICROS_PER_SECOND as i64
    }

    pub fn to_unix_millis(&self) -> i64 {
        self.to_unix_micros() / MICROS_PER_MILLI as i64
    }

    pub fn to_unix_micros(&self) -> i64 {
        self.to_unix_days() * MICROS_PER_DAY as i64
    }

    pub fn from_unix_seconds(seconds: f64) -> Result<Self> {
        Self::from_unix_micros(unix_micros_from_f64(seconds, 1e6)?)
    }

    pub fn from_unix_millis(millis: f64) -> Result<Self> {
        Self::from_unix_micros(unix_micros_from_f64(millis, 1e3)?)
    }

    /// The UTC date of a Unix instant.
    pub fn from_unix_micros(micros: i64) -> Result<Self> {
        Self::from_unix_days(micros.div_euclid(MICROS_PER_DAY as i64))
    }

    pub(crate) fn from_civil(civil: &Civil) -> Result<Self> {
        Self::new(civil.year, civil.month, civil.day)
    }

    /// Current UTC date according to `clock`.
    pub fn now(clock: &dyn Clock) -> Result<Self> {
        Self::from_civil(&clock.civil())
    }

    /// Moves by whole years and months, then clamps the day to the end of the target month.
    ///
    /// The two amounts are combined first, so `add_months(1, -4)` equals `add_months(0, 8)`.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if the resulting year is out of range.
    pub fn add_months(&self, years: i32, months: i32) -> Result<Self> {
        let per_year = MONTHS_PER_YEAR as i64;
        let total = i64::from(self.year().get()) * per_year
            + i64::from(self.month().get() - 1)
            + i64::from(years) * per_year
            + i64::from(months);
        let year = total.div_euclid(per_year);
        let year = i32::try_from(year).map_err(|_| Error::out_of_range(Year::NAME, year, Year::MIN, Year::MAX))?;
        let year = Year::new(year)?;
        let month = Month::new(total.rem_euclid(per_year) as u8 + 1)?;
        let last = last_day_of_month(month.get(), Some(year.get()));
        let day = Day::new(self.day().get().min(last))?;
        Ok(Self::from_parts_unchecked(year, month, day))
    }

    /// Moves by a number of days.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if the result leaves the supported range.
    pub fn add_days(&self, days: i64) -> Result<Self> {
        let target = self.to_unix_days().checked_add(days).unwrap_or(i64::MAX);
        Self::from_unix_days(target)
    }

    /// `yyyymmdd` as one integer, negative for negative years. Orders like the date, but not every
    /// integer is a date.
    pub fn value(&self) -> i64 {
        i64::from(self.year().get()) * 10_000 + i64::from(self.month().get()) * 100 + i64::from(self.day().get())
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        Self::parse_with(text, &Grammar::new(mode, &SystemClock))
    }

    pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
        grammar::parse_all(text, Self::NAME, |cur| Self::read(cur, grammar))
    }

    /// Undelimited `[±]yyyymmdd` (8 or 9 digits) or `year-month-day`. Lenient grammars also
    /// accept `/` and `.` as the delimiter, used twice.
    pub(crate) fn read(cur: &mut Cursor<'_>, grammar: &Grammar<'_>) -> Result<Self> {
        if let Some(civil) = grammar.read_now(cur) {
            return Self::from_civil(&civil);
        }
        cur.transaction(|cur| {
            let input = cur.rest();
            let bad = || Error::content(Self::NAME, input);

            let start = cur.mark();
            let sign = cur.eat_if(|c| c == '+' || c == '-');
            let run = cur.digit_run();
            if run == 8 || run == 9 {
                let year = grammar::digits_value(cur.take_digits(run - 4, run - 4).ok_or_else(bad)?) as i32;
                let month = cur.take_digits(2, 2).map(grammar::digits_value).ok_or_else(bad)?;
                let day = cur.take_digits(2, 2).map(grammar::digits_value).ok_or_else(bad)?;
                let year = if sign == Some('-') { -year } else { year };
                return Self::new(year, month as u8, day as u8);
            }
            cur.reset_to(start);

            let year = Year::read(cur, grammar)?;
            let separator = cur
                .eat_if(|c| c == DATE_SEPARATOR || (!grammar.is_strict() && ALT_DATE_SEPARATORS.contains(&c)))
                .ok_or_else(bad)?;
            let month = Month::read(cur, grammar)?;
            if !cur.eat(separator) {
                return Err(bad());
            }
            let day = Day::read(cur, grammar)?;
            Self::from_parts(year, month, day)
        })
    }

    /// `yyyy-mm-dd`, with the year's sign rules.
    pub fn to_iso_string(&self) -> String {
        format!(
            "{}{DATE_SEPARATOR}{}{DATE_SEPARATOR}{}",
            self.year().to_iso_string(),
            self.month().to_iso_string(),
            self.day().to_iso_string(),
        )
    }

    /// Loads the date stored at the start of `cell`.
    pub(crate) fn load(cell: &[u8]) -> Self {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&cell[..Self::STORAGE]);
        Self(bytes)
    }

    pub(crate) fn store(self, cell: &mut [u8]) {
        cell[..Self::STORAGE].copy_from_slice(&self.0);
    }
}

impl BitPacked for DateOnly {
    const BITS: u32 = Year::BITS + Month::BITS + Day::BITS;

    fn serialize(&self, writer: &mut BitWriter<'_>) -> Result<()> {
        self.year().serialize(writer)?;
        self.month().serialize(writer)?;
        self.day().serialize(writer)
    }

    fn deserialize(reader: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self::from_parts_unchecked(
            Year::deserialize(reader)?,
            Month::deserialize(reader)?,
            Day::deserialize(reader)?,
        ))
    }

    fn validate(&self) -> Result<()> {
        self.year().validate()?;
        self.month().validate()?;
        self.day().validate()?;
        Day::for_month(self.day().get(), self.year().get(), self.month().get()).map(|_| ())
    }
}

impl FromStr for DateOnly {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, ParseMode::Lenient)
    }
}

impl fmt::Display for DateOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl fmt::Debug for DateOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateOnly({self})")
    }
}

text_serde!(DateOnly);
