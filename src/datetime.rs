//! Date-times: a [`DateOnly`] and a [`TimeOnly`] in one cell, labelled with a zone.
//!
//! The zone is only a label. `Utc` adds a `Z` to the text form and nothing else; no offsets are
//! ever applied.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::bits::{BitPacked, BitReader, BitWriter};
use crate::calendar::{Civil, last_day_of_month, unix_micros_from_f64};
use crate::clock::{Clock, SystemClock};
use crate::consts::{
    DATE_TIME_SEPARATOR, MICROS_PER_DAY, MICROS_PER_MILLI, MICROS_PER_SECOND, MONTH_FRACTIONS,
    UTC_DESIGNATOR,
};
use crate::cursor::Cursor;
use crate::date::DateOnly;
use crate::duration::Duration;
use crate::exact::DurationExact;
use crate::grammar::{self, Grammar, ParseMode};
use crate::prelude::*;
use crate::time::TimeOnly;
use crate::{Error, Result};

const DATE_AT: usize = 0;
const TIME_AT: usize = DateOnly::STORAGE;
const STORAGE: usize = DateOnly::STORAGE + TimeOnly::STORAGE;

/// The label carried by a [`DateTime`].
pub trait Zone: Copy + Eq + Ord + Hash + Default + fmt::Debug + 'static {
    /// Letter closing the ISO form, if any.
    const DESIGNATOR: Option<char>;
}

/// Wall-clock time of an unspecified place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display)]
#[display(fmt = "local")]
pub struct Local;

impl Zone for Local {
    const DESIGNATOR: Option<char> = None;
}

/// Coordinated Universal Time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display)]
#[display(fmt = "UTC")]
pub struct Utc;

impl Zone for Utc {
    const DESIGNATOR: Option<char> = Some(UTC_DESIGNATOR);
}

/// A date and a microsecond time of day.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime<Z: Zone> {
    cell: [u8; STORAGE],
    zone: PhantomData<Z>,
}

pub type DateTimeLocal = DateTime<Local>;
pub type DateTimeUtc = DateTime<Utc>;

impl<Z: Zone> DateTime<Z> {
    const NAME: &'static str = "date-time";

    /// # Errors
    /// The errors of [`DateOnly::new`] and [`TimeOnly::new`].
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8, microsecond: u32) -> Result<Self> {
        Ok(Self::from_date_time(
            DateOnly::new(year, month, day)?,
            TimeOnly::new(hour, minute, second, microsecond)?,
        ))
    }

    pub fn from_date_time(date: DateOnly, time: TimeOnly) -> Self {
        let mut cell = [0; STORAGE];
        date.store(&mut cell[DATE_AT..]);
        time.store(&mut cell[TIME_AT..]);
        Self {
            cell,
            zone: PhantomData,
        }
    }

    pub fn date(&self) -> DateOnly {
        DateOnly::load(&self.cell[DATE_AT..])
    }

    pub fn time(&self) -> TimeOnly {
        TimeOnly::load(&self.cell[TIME_AT..])
    }

    /// The same fields under another label.
    pub fn with_zone<Y: Zone>(self) -> DateTime<Y> {
        DateTime {
            cell: self.cell,
            zone: PhantomData,
        }
    }

    /// Microseconds since 1970-01-01T00:00:00, reading the fields as UTC.
    pub fn to_unix_micros(&self) -> i64 {
        self.date().to_unix_micros() + self.time().to_micros_of_day() as i64
    }

    /// Unix milliseconds, rounded down.
    pub fn to_unix_millis(&self) -> i64 {
        self.to_unix_micros().div_euclid(MICROS_PER_MILLI as i64)
    }

    /// Unix seconds, rounded down.
    pub fn to_unix_seconds(&self) -> i64 {
        self.to_unix_micros().div_euclid(MICROS_PER_SECOND as i64)
    }

    /// # Errors
    /// Returns `Error::OutOfRange` outside the supported years.
    pub fn from_unix_micros(micros: i64) -> Result<Self> {
        Ok(Self::from_date_time(DateOnly::from_unix_micros(micros)?, TimeOnly::from_unix_micros(micros)))
    }

    pub fn from_unix_millis(millis: f64) -> Result<Self> {
        Self::from_unix_micros(unix_micros_from_f64(millis, 1e3)?)
    }

    pub fn from_unix_seconds(seconds: f64) -> Result<Self> {
        Self::from_unix_micros(unix_micros_from_f64(seconds, 1e6)?)
    }

    fn from_civil(civil: &Civil) -> Result<Self> {
        Ok(Self::from_date_time(DateOnly::from_civil(civil)?, TimeOnly::from_civil(civil)))
    }

    /// Current instant according to `clock`, as UTC fields.
    pub fn now(clock: &dyn Clock) -> Result<Self> {
        Self::from_civil(&clock.civil())
    }

    /// Moves the date by whole years and months, clamping the day. The time is kept.
    pub fn add_months(&self, years: i32, months: i32) -> Result<Self> {
        Ok(Self::from_date_time(self.date().add_months(years, months)?, self.time()))
    }

    /// Moves the date by whole days. The time is kept.
    pub fn add_days(&self, days: i64) -> Result<Self> {
        Ok(Self::from_date_time(self.date().add_days(days)?, self.time()))
    }

    /// `yyyymmddhhmmssffffff` as one integer. Orders like the date-time.
    pub fn value(&self) -> i128 {
        i128::from(self.date().value()) * 1_000_000_000_000 + i128::from(self.time().value())
    }

    /// Adds a calendar duration: whole years and months first (clamping the day), then the month
    /// fraction as a share of the month reached, then the exact part.
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` if the result leaves the supported range.
    pub fn checked_add(&self, duration: &Duration) -> Result<Self> {
        let moved = self.add_months(duration.years() as i32, duration.whole_months() as i32)?;
        let micros = moved.month_fraction_micros(duration) + duration.exact_part().total_micros();
        moved.shift(i128::from(micros))
    }

    /// Subtracts a calendar duration, mirroring [`DateTime::checked_add`].
    pub fn checked_sub(&self, duration: &Duration) -> Result<Self> {
        let moved = self.add_months(-(duration.years() as i32), -(duration.whole_months() as i32))?;
        let micros = moved.month_fraction_micros(duration) + duration.exact_part().total_micros();
        moved.shift(-i128::from(micros))
    }

    pub fn checked_add_exact(&self, duration: &DurationExact) -> Result<Self> {
        self.shift(i128::from(duration.total_micros()))
    }

    pub fn checked_sub_exact(&self, duration: &DurationExact) -> Result<Self> {
        self.shift(-i128::from(duration.total_micros()))
    }

    /// Exact time elapsed from `earlier` to `self`.
    ///
    /// # Errors
    /// Returns `Error::Negative` if `earlier` is later than `self`.
    pub fn duration_since(&self, earlier: &Self) -> Result<DurationExact> {
        let elapsed = self.to_unix_micros() - earlier.to_unix_micros();
        let elapsed = u64::try_from(elapsed).map_err(|_| Error::Negative { what: "elapsed time" })?;
        DurationExact::from_total_micros(elapsed)
    }

    /// The duration's month fraction measured in this date's month.
    fn month_fraction_micros(&self, duration: &Duration) -> u64 {
        let date = self.date();
        let month_days = u64::from(last_day_of_month(date.month().get(), Some(date.year().get())));
        u64::from(duration.month_fraction()) * month_days * (MICROS_PER_DAY / MONTH_FRACTIONS)
    }

    fn shift(&self, micros: i128) -> Result<Self> {
        let target = i128::from(self.to_unix_micros()) + micros;
        let target = target.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
        Self::from_unix_micros(target)
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        Self::parse_with(text, &Grammar::new(mode, &SystemClock))
    }

    pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
        grammar::parse_all(text, Self::NAME, |cur| Self::read(cur, grammar))
    }

    /// `date T time`, then the zone designator. Lenient grammars also join with `t` or a space,
    /// take a bare date as midnight and make the designator optional.
    pub(crate) fn read(cur: &mut Cursor<'_>, grammar: &Grammar<'_>) -> Result<Self> {
        if let Some(civil) = grammar.read_now(cur) {
            return Self::from_civil(&civil);
        }
        cur.transaction(|cur| {
            let input = cur.rest();
            let bad = || Error::content(Self::NAME, input);

            let date = DateOnly::read(cur, grammar)?;
            let joined = cur.eat(DATE_TIME_SEPARATOR)
                || (!grammar.is_strict() && cur.eat_if(|c| c == 't' || c == ' ').is_some());
            let time = if joined {
                TimeOnly::read(cur, grammar)?
            } else if grammar.is_strict() {
                return Err(bad());
            } else {
                TimeOnly::midnight()
            };

            if let Some(designator) = Z::DESIGNATOR {
                let found = cur.eat(designator)
                    || (!grammar.is_strict() && cur.eat(designator.to_ascii_lowercase()));
                if grammar.is_strict() && !found {
                    return Err(bad());
                }
            }
            Ok(Self::from_date_time(date, time))
        })
    }

    /// `yyyy-mm-ddThh:mm:ss.ffffff`, plus `Z` for UTC.
    pub fn to_iso_string(&self) -> String {
        let mut iso = format!(
            "{}{DATE_TIME_SEPARATOR}{}",
            self.date().to_iso_string(),
            self.time().to_iso_string()
        );
        if let Some(designator) = Z::DESIGNATOR {
            iso.push(designator);
        }
        iso
    }
}

impl<Z: Zone> BitPacked for DateTime<Z> {
    const BITS: u32 = DateOnly::BITS + TimeOnly::BITS;

    fn serialize(&self, writer: &mut BitWriter<'_>) -> Result<()> {
        self.date().serialize(writer)?;
        self.time().serialize(writer)
    }

    fn deserialize(reader: &mut BitReader<'_>) -> Result<Self> {
        let date = DateOnly::deserialize(reader)?;
        Ok(Self::from_date_time(date, TimeOnly::deserialize(reader)?))
    }

    fn validate(&self) -> Result<()> {
        self.date().validate()?;
        self.time().validate()
    }
}

impl<Z: Zone> FromStr for DateTime<Z> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, ParseMode::Lenient)
    }
}

impl<Z: Zone> fmt::Display for DateTime<Z> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl<Z: Zone> fmt::Debug for DateTime<Z> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateTime({self})")
    }
}

impl<Z: Zone> serde::Serialize for DateTime<Z> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de, Z: Zone> serde::Deserialize<'de> for DateTime<Z> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
