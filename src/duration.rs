//! Calendar durations: years and fractional months on top of an exact span.
//!
//! Years and months are kept as one count of month fractions (1/720 month, 8640 per year).
//! Days never reach a full 400-year cycle (146,097 days); whole cycles move into the years.
//!
//! Cell layout: month fractions in bytes 0..4, days in 4..7, then a [`TimeOnly`] cell.

use std::fmt;
use std::str::FromStr;

use crate::bits::{BitPacked, BitReader, BitWriter};
use crate::cell;
use crate::clock::SystemClock;
use crate::consts::{
    DAYS_PER_CYCLE, MAX_DURATION_YEARS, MICROS_PER_DAY, MONTH_FRACTIONS, MONTHS_PER_YEAR,
    YEAR_FRACTIONS, YEARS_PER_CYCLE,
};
use crate::exact::{self, DurationExact};
use crate::grammar::{self, Grammar, ParseMode};
use crate::prelude::text_serde;
use crate::time::TimeOnly;
use crate::{Error, Result};

const UNITS_AT: usize = 0;
const UNITS_STORAGE: usize = 4;
const DAYS_AT: usize = 4;
const DAYS_STORAGE: usize = 3;
const TIME_AT: usize = 7;
const UNITS_BITS: u32 = 32;
const DAYS_BITS: u32 = 19;

const MAX_UNITS: u64 = MAX_DURATION_YEARS * YEAR_FRACTIONS;
const CYCLE_UNITS: u64 = YEARS_PER_CYCLE * YEAR_FRACTIONS;
const CYCLE_MICROS: u64 = DAYS_PER_CYCLE * MICROS_PER_DAY;
const NAME: &str = "duration";

/// The parts a duration is built from. Every part may be fractional and larger than its unit's
/// usual bound; construction rolls them into canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DurationParts {
    pub years:   f64,
    pub months:  f64,
    pub days:    f64,
    pub hours:   f64,
    pub minutes: f64,
    pub seconds: f64,
    pub micros:  f64,
}

impl DurationParts {
    pub const fn with_years(mut self, years: f64) -> Self {
        self.years = years;
        self
    }

    pub const fn with_months(mut self, months: f64) -> Self {
        self.months = months;
        self
    }

    pub const fn with_days(mut self, days: f64) -> Self {
        self.days = days;
        self
    }

    pub const fn with_hours(mut self, hours: f64) -> Self {
        self.hours = hours;
        self
    }

    pub const fn with_minutes(mut self, minutes: f64) -> Self {
        self.minutes = minutes;
        self
    }

    pub const fn with_seconds(mut self, seconds: f64) -> Self {
        self.seconds = seconds;
        self
    }

    pub const fn with_micros(mut self, micros: f64) -> Self {
        self.micros = micros;
        self
    }

    /// Sets a part by its position in `y m d h i s` order.
    pub(crate) fn set(&mut self, rank: usize, value: f64) {
        match rank {
            0 => self.years = value,
            1 => self.months = value,
            2 => self.days = value,
            3 => self.hours = value,
            4 => self.minutes = value,
            _ => self.seconds = value,
        }
    }

    fn all(&self) -> [f64; 7] {
        [self.years, self.months, self.days, self.hours, self.minutes, self.seconds, self.micros]
    }

    pub(crate) fn check(&self, what: &'static str) -> Result<()> {
        for part in self.all() {
            if !part.is_finite() {
                return Err(Error::AtMost {
                    what,
                    max: "a finite number",
                });
            }
            if part < 0.0 {
                return Err(Error::Negative { what });
            }
        }
        Ok(())
    }
}

/// A duration with calendar units.
///
/// Years and months have no fixed length until applied to a date, so two durations compare by
/// their fields in order (years and months, then days, then the time) and not by elapsed time:
/// `1y30d` is ordered before `1y1m` even though February is shorter than 30 days. Only compare
/// durations built from the same units.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration([u8; 13]);

impl Duration {
    /// Builds a duration from parts of any size.
    ///
    /// Years and months are combined and rounded to the nearest 1/720 month. The exact parts roll
    /// up into days, and whole 400-year cycles of days into years.
    ///
    /// # Errors
    /// `Error::Negative` or `Error::AtMost` for negative, non-finite or too large parts, or if the
    /// total exceeds 367,200 years.
    pub fn from_parts(parts: DurationParts) -> Result<Self> {
        let (days, micros) = exact::exact_micros(&parts, NAME)?;
        let units = ((parts.years * MONTHS_PER_YEAR as f64 + parts.months) * MONTH_FRACTIONS as f64).round();
        if units > MAX_UNITS as f64 {
            return Err(at_most());
        }
        let cycles = days / DAYS_PER_CYCLE;
        let units = (units as u64).checked_add(cycles.saturating_mul(CYCLE_UNITS)).ok_or_else(at_most)?;
        Self::from_split(units, days % DAYS_PER_CYCLE * MICROS_PER_DAY + micros)
    }

    /// `micros` must be below one cycle.
    fn from_split(units: u64, micros: u64) -> Result<Self> {
        debug_assert!(micros < CYCLE_MICROS);
        if units > MAX_UNITS || (units == MAX_UNITS && micros > 0) {
            return Err(at_most());
        }
        Ok(Self::from_fields(
            units as u32,
            (micros / MICROS_PER_DAY) as u32,
            TimeOnly::of_day(micros % MICROS_PER_DAY),
        ))
    }

    fn from_fields(units: u32, days: u32, time: TimeOnly) -> Self {
        let mut cell = [0; 13];
        cell::put(&mut cell[UNITS_AT..], UNITS_STORAGE, units);
        cell::put(&mut cell[DAYS_AT..], DAYS_STORAGE, days);
        time.store(&mut cell[TIME_AT..]);
        Self(cell)
    }

    pub const fn zero() -> Self {
        Self([0; 13])
    }

    /// The longest duration, exactly 367,200 years.
    pub fn max() -> Self {
        Self::from_fields(MAX_UNITS as u32, 0, TimeOnly::midnight())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Years and months as month fractions.
    fn units(&self) -> u32 {
        cell::get(&self.0[UNITS_AT..], UNITS_STORAGE)
    }

    pub fn years(&self) -> u32 {
        self.units() / YEAR_FRACTIONS as u32
    }

    /// Months beyond the whole years, in 1/720 month.
    pub fn month_units(&self) -> u32 {
        self.units() % YEAR_FRACTIONS as u32
    }

    /// Months beyond the whole years.
    pub fn months(&self) -> f64 {
        f64::from(self.month_units()) / MONTH_FRACTIONS as f64
    }

    pub(crate) fn whole_months(&self) -> u32 {
        self.month_units() / MONTH_FRACTIONS as u32
    }

    /// The fraction of a month left after the whole months, in 1/720 month.
    pub(crate) fn month_fraction(&self) -> u32 {
        self.month_units() % MONTH_FRACTIONS as u32
    }

    pub fn days(&self) -> u32 {
        cell::get(&self.0[DAYS_AT..], DAYS_STORAGE)
    }

    pub fn hours(&self) -> u8 {
        self.time().hour().get()
    }

    pub fn minutes(&self) -> u8 {
        self.time().minute().get()
    }

    pub fn seconds(&self) -> u8 {
        self.time().second().get()
    }

    pub fn microseconds(&self) -> u32 {
        self.time().microsecond().get()
    }

    fn time(&self) -> TimeOnly {
        TimeOnly::load(&self.0[TIME_AT..])
    }

    /// True without years and months.
    pub fn is_exact(&self) -> bool {
        self.units() == 0
    }

    /// The days and time, without the years and months.
    pub fn exact_part(&self) -> DurationExact {
        DurationExact::from_fields(self.days(), self.time())
    }

    /// Days and time as microseconds, always below one cycle.
    fn exact_micros(&self) -> u64 {
        self.exact_part().total_micros()
    }

    /// Sum of two durations. An exact operand's days count as 24 hours each.
    ///
    /// # Errors
    /// Returns `Error::AtMost` if the sum exceeds 367,200 years.
    pub fn checked_add(&self, other: impl Into<Self>) -> Result<Self> {
        let other = other.into();
        let units = u64::from(self.units()) + u64::from(other.units());
        let micros = self.exact_micros() + other.exact_micros();
        let (carry, micros) = (micros / CYCLE_MICROS, micros % CYCLE_MICROS);
        Self::from_split(units + carry * CYCLE_UNITS, micros)
    }

    /// Difference of two durations, zero if it would be negative.
    ///
    /// Days and time borrow from the years only in whole 400-year cycles.
    pub fn saturating_sub(&self, other: impl Into<Self>) -> Self {
        let other = other.into();
        let mut units = i64::from(self.units()) - i64::from(other.units());
        let mut micros = self.exact_micros() as i64 - other.exact_micros() as i64;
        if micros < 0 {
            units -= CYCLE_UNITS as i64;
            micros += CYCLE_MICROS as i64;
        }
        if units < 0 {
            return Self::zero();
        }
        Self::from_split(units as u64, micros as u64).unwrap_or_default()
    }

    /// Clock-like `h:mm:ss.ffffff`. Durations over 500 hours, or with years or months, show as
    /// `500:00:00.000000`.
    pub fn to_time_like(&self) -> String {
        let micros = if self.is_exact() { self.exact_micros() } else { u64::MAX };
        exact::time_like(micros)
    }

    /// Reads the clock-like form written by [`Duration::to_time_like`].
    pub fn from_time_like(text: &str) -> Result<Self> {
        grammar::parse_all(text, NAME, exact::read_time_like).and_then(Self::from_parts)
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        Self::parse_with(text, &Grammar::new(mode, &SystemClock))
    }

    /// Unit-suffix text such as `1y2.5m3d4h5i6.5s`; lenient grammars also take ISO 8601
    /// `P1Y2.5M3DT4H5M6.5S`.
    pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
        grammar::parse_all(text, NAME, |cur| grammar::read_duration_parts(cur, grammar, NAME))
            .and_then(Self::from_parts)
    }

    /// ISO 8601 duration, `PT0S` when zero.
    pub fn to_iso_string(&self) -> String {
        let mut iso = String::from("P");
        if self.years() > 0 {
            iso.push_str(&format!("{}Y", self.years()));
        }
        if self.month_units() > 0 {
            iso.push_str(&format!("{}M", months_text(self.month_units())));
        }
        if self.days() > 0 {
            iso.push_str(&format!("{}D", self.days()));
        }
        exact::push_iso_time(&mut iso, self.time());
        iso
    }
}

fn at_most() -> Error {
    Error::AtMost {
        what: NAME,
        max:  "367200y",
    }
}

/// Whole months and up to six decimals of the fraction, trailing zeros dropped.
fn months_text(month_units: u32) -> String {
    let fractions = MONTH_FRACTIONS as u32;
    let whole = month_units / fractions;
    let rest = month_units % fractions;
    if rest == 0 {
        return whole.to_string();
    }
    let millionths = (rest * 1_000_000 + fractions / 2) / fractions;
    let digits = format!("{millionths:06}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

impl From<DurationExact> for Duration {
    fn from(exact: DurationExact) -> Self {
        let micros = exact.total_micros();
        let units = micros / CYCLE_MICROS * CYCLE_UNITS;
        Self::from_split(units, micros % CYCLE_MICROS).unwrap_or_default()
    }
}

impl TryFrom<Duration> for DurationExact {
    type Error = Error;

    /// # Errors
    /// Returns `Error::Vague` if the duration has years or months.
    fn try_from(duration: Duration) -> Result<Self> {
        if !duration.is_exact() {
            return Err(Error::Vague {
                unit: "years and months",
            });
        }
        Ok(duration.exact_part())
    }
}

impl BitPacked for Duration {
    const BITS: u32 = UNITS_BITS + DAYS_BITS + TimeOnly::BITS;

    fn serialize(&self, writer: &mut BitWriter<'_>) -> Result<()> {
        writer.write_number_be(self.units(), UNITS_BITS)?;
        writer.write_number_be(self.days(), DAYS_BITS)?;
        self.time().serialize(writer)
    }

    fn deserialize(reader: &mut BitReader<'_>) -> Result<Self> {
        let units = reader.read_number_be(UNITS_BITS)?;
        let days = reader.read_number_be(DAYS_BITS)?;
        Ok(Self::from_fields(units, days, TimeOnly::deserialize(reader)?))
    }

    fn validate(&self) -> Result<()> {
        self.time().validate()?;
        let days = u64::from(self.days());
        if days >= DAYS_PER_CYCLE {
            return Err(Error::out_of_range("days", days as i64, 0, (DAYS_PER_CYCLE - 1) as i64));
        }
        let units = u64::from(self.units());
        if units > MAX_UNITS || (units == MAX_UNITS && self.exact_micros() > 0) {
            return Err(at_most());
        }
        Ok(())
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, ParseMode::Lenient)
    }
}

/// Unit-suffix form (`1y1.5m1d1h1i1.5s`), `0s` when zero.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0s");
        }
        if self.years() > 0 {
            write!(f, "{}y", self.years())?;
        }
        if self.month_units() > 0 {
            write!(f, "{}m", months_text(self.month_units()))?;
        }
        if self.days() > 0 {
            write!(f, "{}d", self.days())?;
        }
        exact::fmt_time_units(f, self.time())
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({self})")
    }
}

text_serde!(Duration);
