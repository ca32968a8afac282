//! Exact elapsed spans: days of 24 hours plus a time of day.
//!
//! Cell layout: day count in bytes 0..4, then a [`TimeOnly`] cell. The derived ordering of the
//! cell is the ordering of the spans.

use std::fmt;
use std::str::FromStr;

use crate::bits::{BitPacked, BitReader, BitWriter};
use crate::cell;
use crate::consts::{
    FRACTION_SEPARATOR, MAX_EXACT_DAYS, MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MINUTE,
    MICROS_PER_SECOND, TIME_LIKE_MAX_HOURS, TIME_SEPARATOR,
};
use crate::cursor::Cursor;
use crate::duration::DurationParts;
use crate::grammar::{self, Grammar, ParseMode};
use crate::prelude::text_serde;
use crate::time::TimeOnly;
use crate::types::{Minute, Second};
use crate::{Error, Result};

const DAYS_AT: usize = 0;
const DAYS_STORAGE: usize = 4;
const TIME_AT: usize = 4;
const DAYS_BITS: u32 = 27;
const MAX_TOTAL_MICROS: u64 = MAX_EXACT_DAYS * MICROS_PER_DAY;
const NAME: &str = "exact duration";

/// A span of time in fixed units: days of exactly 24 hours, hours, minutes, seconds and
/// microseconds.
///
/// At most 134,117,046 days (367,200 Gregorian years).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DurationExact([u8; 10]);

impl DurationExact {
    /// Builds a span from parts of any size, rolling each into the next larger unit.
    ///
    /// # Errors
    /// * `Error::Vague` if years or months are given.
    /// * `Error::Negative` or `Error::AtMost` for negative, non-finite or too large parts.
    pub fn from_parts(parts: DurationParts) -> Result<Self> {
        if parts.years != 0.0 {
            return Err(Error::Vague { unit: "years" });
        }
        if parts.months != 0.0 {
            return Err(Error::Vague { unit: "months" });
        }
        let (days, micros) = exact_micros(&parts, NAME)?;
        Self::from_days_micros(days, micros)
    }

    /// A span of `micros` microseconds.
    ///
    /// # Errors
    /// Returns `Error::AtMost` above the maximum span.
    pub fn from_total_micros(micros: u64) -> Result<Self> {
        Self::from_days_micros(micros / MICROS_PER_DAY, micros % MICROS_PER_DAY)
    }

    fn from_days_micros(days: u64, micros: u64) -> Result<Self> {
        if days > MAX_EXACT_DAYS || (days == MAX_EXACT_DAYS && micros > 0) {
            return Err(at_most());
        }
        Ok(Self::from_fields(days as u32, TimeOnly::of_day(micros)))
    }

    pub(crate) fn from_fields(days: u32, time: TimeOnly) -> Self {
        let mut cell = [0; 10];
        cell::put(&mut cell[DAYS_AT..], DAYS_STORAGE, days);
        time.store(&mut cell[TIME_AT..]);
        Self(cell)
    }

    pub const fn zero() -> Self {
        Self([0; 10])
    }

    /// The longest span, exactly 134,117,046 days.
    pub fn max() -> Self {
        Self::from_fields(MAX_EXACT_DAYS as u32, TimeOnly::midnight())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
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

    /// The sub-day part.
    pub(crate) fn time(&self) -> TimeOnly {
        TimeOnly::load(&self.0[TIME_AT..])
    }

    pub fn total_micros(&self) -> u64 {
        u64::from(self.days()) * MICROS_PER_DAY + self.time().to_micros_of_day()
    }

    /// Sum of two spans.
    ///
    /// # Errors
    /// Returns `Error::AtMost` if the sum exceeds the maximum span.
    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        let total = self.total_micros().checked_add(other.total_micros()).ok_or_else(at_most)?;
        if total > MAX_TOTAL_MICROS {
            return Err(at_most());
        }
        Self::from_total_micros(total)
    }

    /// Difference of two spans, zero if `other` is longer.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        let total = self.total_micros().saturating_sub(other.total_micros());
        Self::from_days_micros(total / MICROS_PER_DAY, total % MICROS_PER_DAY).unwrap_or_default()
    }

    /// Clock-like `h:mm:ss.ffffff`. Spans over 500 hours show as `500:00:00.000000`.
    pub fn to_time_like(&self) -> String {
        time_like(self.total_micros())
    }

    /// Reads the clock-like form written by [`DurationExact::to_time_like`]. Minutes and
    /// seconds must be below 60; the fraction may have 1 to 6 digits.
    pub fn from_time_like(text: &str) -> Result<Self> {
        grammar::parse_all(text, NAME, read_time_like).and_then(Self::from_parts)
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        Self::parse_with(text, &Grammar::new(mode, &crate::clock::SystemClock))
    }

    /// Unit-suffix text such as `1d2h3i4.5s`; lenient grammars also take ISO 8601 `P1DT2H`.
    pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
        grammar::parse_all(text, NAME, |cur| grammar::read_duration_parts(cur, grammar, NAME))
            .and_then(Self::from_parts)
    }

    /// ISO 8601 duration, `PT0S` when zero.
    pub fn to_iso_string(&self) -> String {
        let mut iso = String::from("P");
        if self.days() > 0 {
            iso.push_str(&format!("{}D", self.days()));
        }
        push_iso_time(&mut iso, self.time());
        iso
    }
}

fn at_most() -> Error {
    Error::AtMost {
        what: NAME,
        max:  "134117046d",
    }
}

/// Splits the exact parts into whole days and the microseconds of the remaining partial day.
///
/// The sub-day parts and the fraction of the day part are summed as microseconds and rounded, so
/// `1.001s` is exactly 1,001,000us. Sums past 2^53us can no longer hold every microsecond.
pub(crate) fn exact_micros(parts: &DurationParts, what: &'static str) -> Result<(u64, u64)> {
    const PRECISE: f64 = 9_007_199_254_740_992.0; // 2^53
    const LIMIT: f64 = 18_446_744_073_709_551_616.0; // 2^64

    parts.check(what)?;
    let whole_days = parts.days.trunc();
    let micros = ((parts.days - whole_days) * MICROS_PER_DAY as f64
        + parts.hours * MICROS_PER_HOUR as f64
        + parts.minutes * MICROS_PER_MINUTE as f64
        + parts.seconds * MICROS_PER_SECOND as f64
        + parts.micros)
        .round();
    if micros >= PRECISE {
        log::debug!("{what} of {micros}us is past f64 integer precision, microseconds may be lost");
    }
    if whole_days >= LIMIT || micros >= LIMIT {
        return Err(Error::AtMost {
            what,
            max: "2^64 microseconds",
        });
    }
    let micros = micros as u64;
    let days = (whole_days as u64)
        .checked_add(micros / MICROS_PER_DAY)
        .ok_or(Error::AtMost {
            what,
            max: "2^64 days",
        })?;
    Ok((days, micros % MICROS_PER_DAY))
}

/// Appends `T…H…M…S` for a non-zero time, or `T0S` if nothing has been written after `P`.
pub(crate) fn push_iso_time(iso: &mut String, time: TimeOnly) {
    let (h, m, s, us) = (time.hour().get(), time.minute().get(), time.second().get(), time.microsecond().get());
    if h == 0 && m == 0 && s == 0 && us == 0 {
        if iso.len() == 1 {
            iso.push_str("T0S");
        }
        return;
    }
    iso.push('T');
    if h > 0 {
        iso.push_str(&format!("{h}H"));
    }
    if m > 0 {
        iso.push_str(&format!("{m}M"));
    }
    if s > 0 || us > 0 {
        iso.push_str(&format!("{}S", seconds_text(s, us)));
    }
}

/// Writes `h`, `i` and `s` units of a time of day in unit-suffix form.
pub(crate) fn fmt_time_units(f: &mut fmt::Formatter<'_>, time: TimeOnly) -> fmt::Result {
    let (h, m, s, us) = (time.hour().get(), time.minute().get(), time.second().get(), time.microsecond().get());
    if h > 0 {
        write!(f, "{h}h")?;
    }
    if m > 0 {
        write!(f, "{m}i")?;
    }
    if s > 0 || us > 0 {
        write!(f, "{}s", seconds_text(s, us))?;
    }
    Ok(())
}

/// `s` or `s.ffffff` without trailing zeros.
fn seconds_text(seconds: u8, micros: u32) -> String {
    if micros == 0 {
        return seconds.to_string();
    }
    let fraction = format!("{micros:06}");
    format!("{seconds}{FRACTION_SEPARATOR}{}", fraction.trim_end_matches('0'))
}

pub(crate) fn time_like(total_micros: u64) -> String {
    let total = total_micros.min(TIME_LIKE_MAX_HOURS * MICROS_PER_HOUR);
    let hours = total / MICROS_PER_HOUR;
    let rest = TimeOnly::of_day(total % MICROS_PER_HOUR);
    format!(
        "{hours}{TIME_SEPARATOR}{}{TIME_SEPARATOR}{}{FRACTION_SEPARATOR}{}",
        rest.minute().to_iso_string(),
        rest.second().to_iso_string(),
        rest.microsecond().to_iso_string(),
    )
}

/// `h:mm:ss[.f…]` with any number of hours.
pub(crate) fn read_time_like(cur: &mut Cursor<'_>) -> Result<DurationParts> {
    let input = cur.rest();
    let bad = || Error::content(NAME, input);
    let grammar = Grammar::strict();

    let hours = cur.take_digits(1, 9).map(grammar::digits_value).ok_or_else(bad)?;
    if !cur.eat(TIME_SEPARATOR) {
        return Err(bad());
    }
    let minutes = Minute::new(grammar.read_number(cur, 2).ok_or_else(bad)? as u8)?;
    if !cur.eat(TIME_SEPARATOR) {
        return Err(bad());
    }
    let seconds = Second::new(grammar.read_number(cur, 2).ok_or_else(bad)? as u8)?;
    let micros = if cur.eat(FRACTION_SEPARATOR) {
        Grammar::lenient().read_fraction(cur, 6).ok_or_else(bad)?
    } else {
        0
    };
    Ok(DurationParts::default()
        .with_hours(f64::from(hours))
        .with_minutes(f64::from(minutes.get()))
        .with_seconds(f64::from(seconds.get()))
        .with_micros(f64::from(micros)))
}

impl BitPacked for DurationExact {
    const BITS: u32 = DAYS_BITS + TimeOnly::BITS;

    fn serialize(&self, writer: &mut BitWriter<'_>) -> Result<()> {
        writer.write_number_be(self.days(), DAYS_BITS)?;
        self.time().serialize(writer)
    }

    fn deserialize(reader: &mut BitReader<'_>) -> Result<Self> {
        let days = reader.read_number_be(DAYS_BITS)?;
        Ok(Self::from_fields(days, TimeOnly::deserialize(reader)?))
    }

    fn validate(&self) -> Result<()> {
        self.time().validate()?;
        let days = u64::from(self.days());
        if days > MAX_EXACT_DAYS || (days == MAX_EXACT_DAYS && self.time() != TimeOnly::midnight()) {
            return Err(at_most());
        }
        Ok(())
    }
}

impl From<DurationExact> for std::time::Duration {
    fn from(duration: DurationExact) -> Self {
        Self::from_micros(duration.total_micros())
    }
}

/// Truncates to whole microseconds.
impl TryFrom<std::time::Duration> for DurationExact {
    type Error = Error;

    fn try_from(duration: std::time::Duration) -> Result<Self> {
        let micros = u64::try_from(duration.as_micros()).map_err(|_| at_most())?;
        if micros > MAX_TOTAL_MICROS {
            return Err(at_most());
        }
        Self::from_total_micros(micros)
    }
}

impl FromStr for DurationExact {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, ParseMode::Lenient)
    }
}

/// Unit-suffix form (`1d2h3i4.5s`), `0s` when zero.
impl fmt::Display for DurationExact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0s");
        }
        if self.days() > 0 {
            write!(f, "{}d", self.days())?;
        }
        fmt_time_units(f, self.time())
    }
}

impl fmt::Debug for DurationExact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DurationExact({self})")
    }
}

text_serde!(DurationExact);

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(parts: DurationParts) -> DurationExact {
        DurationExact::from_parts(parts).unwrap()
    }

    #[test]
    fn test_rollup() {
        struct TestCase {
            parts:    DurationParts,
            expected: &'static str,
        }

        let cases = [
            TestCase {
                parts:    DurationParts::default().with_hours(24.0),
                expected: "1d",
            },
            TestCase {
                parts:    DurationParts::default().with_seconds(60.0),
                expected: "1i",
            },
            TestCase {
                parts:    DurationParts::default().with_minutes(60.0),
                expected: "1h",
            },
            TestCase {
                parts:    DurationParts::default().with_micros(1_000_000.0),
                expected: "1s",
            },
            TestCase {
                parts:    DurationParts::default().with_seconds(1.001),
                expected: "1.001s",
            },
            TestCase {
                parts:    DurationParts::default().with_days(1.5),
                expected: "1d12h",
            },
            TestCase {
                parts:    DurationParts::default().with_hours(25.5).with_seconds(90.0),
                expected: "1d1h31i30s",
            },
            TestCase {
                parts:    DurationParts::default(),
                expected: "0s",
            },
            TestCase {
                parts:    DurationParts::default().with_micros(1.0),
                expected: "0.000001s",
            },
        ];

        for case in &cases {
            assert_eq!(exact(case.parts).to_string(), case.expected, "{:?}", case.parts);
        }
    }

    #[test]
    fn test_limits() {
        let max = exact(DurationParts::default().with_days(MAX_EXACT_DAYS as f64));
        assert_eq!(max, DurationExact::max());
        assert_eq!(max.to_string(), "134117046d");

        let over = DurationExact::from_parts(DurationParts::default().with_days(MAX_EXACT_DAYS as f64).with_micros(1.0));
        assert!(matches!(over, Err(Error::AtMost { .. })));

        assert!(matches!(
            DurationExact::from_parts(DurationParts::default().with_hours(-1.0)),
            Err(Error::Negative { .. })
        ));
        assert!(matches!(
            DurationExact::from_parts(DurationParts::default().with_seconds(f64::INFINITY)),
            Err(Error::AtMost { .. })
        ));
        assert_eq!(
            DurationExact::from_parts(DurationParts::default().with_months(1.0)),
            Err(Error::Vague { unit: "months" })
        );
    }

    #[test]
    fn test_add_sub() {
        let day = exact(DurationParts::default().with_days(1.0));
        let hours = exact(DurationParts::default().with_hours(25.0));
        assert!(day.saturating_sub(&hours).is_zero());
        assert_eq!(hours.saturating_sub(&day).to_string(), "1h");
        assert_eq!(day.checked_add(&hours).unwrap().to_string(), "2d1h");

        let half = exact(DurationParts::default().with_seconds(0.5));
        assert_eq!(half.checked_add(&half).unwrap().to_string(), "1s");

        assert!(matches!(DurationExact::max().checked_add(&half), Err(Error::AtMost { .. })));
        assert_eq!(DurationExact::max().saturating_sub(&DurationExact::zero()), DurationExact::max());
    }

    #[test]
    fn test_ordering_is_field_order() {
        let a = exact(DurationParts::default().with_hours(23.0));
        let b = exact(DurationParts::default().with_days(1.0));
        let c = exact(DurationParts::default().with_days(1.0).with_micros(1.0));
        assert!(a < b);
        assert!(c > b);
        assert!(DurationExact::max() > c);
    }

    #[test]
    fn test_parse() {
        let parsed = DurationExact::parse("1d2h3i4.5s", ParseMode::Strict).unwrap();
        assert_eq!(
            (parsed.days(), parsed.hours(), parsed.minutes(), parsed.seconds(), parsed.microseconds()),
            (1, 2, 3, 4, 500_000)
        );
        assert_eq!(DurationExact::parse("36h", ParseMode::Strict).unwrap().to_string(), "1d12h");
        assert_eq!(DurationExact::parse("1.5D", ParseMode::Lenient).unwrap().to_string(), "1d12h");
        assert_eq!(DurationExact::parse("P1DT2H", ParseMode::Lenient).unwrap().to_string(), "1d2h");
        assert_eq!(DurationExact::parse("P1W", ParseMode::Lenient).unwrap().to_string(), "7d");
        assert!(DurationExact::parse("1.5d", ParseMode::Strict).is_err());
        assert_eq!(DurationExact::parse("1y", ParseMode::Strict), Err(Error::Vague { unit: "years" }));
        assert!(DurationExact::parse("now", ParseMode::Lenient).is_err());
        assert!(DurationExact::parse("", ParseMode::Lenient).is_err());
    }

    #[test]
    fn test_iso() {
        assert_eq!(DurationExact::zero().to_iso_string(), "PT0S");
        assert_eq!(exact(DurationParts::default().with_days(2.0)).to_iso_string(), "P2D");
        assert_eq!(
            exact(DurationParts::default().with_days(1.0).with_minutes(5.0).with_seconds(0.25)).to_iso_string(),
            "P1DT5M0.25S"
        );
        let text = exact(DurationParts::default().with_hours(30.0).with_seconds(1.5)).to_iso_string();
        assert_eq!(text, "P1DT6H1.5S");
        assert_eq!(DurationExact::parse(&text, ParseMode::Lenient).unwrap().to_iso_string(), text);
    }

    #[test]
    fn test_time_like() {
        let span = exact(DurationParts::default().with_hours(26.0).with_minutes(3.0).with_micros(7.0));
        assert_eq!(span.to_time_like(), "26:03:00.000007");
        assert_eq!(DurationExact::from_time_like("26:03:00.000007").unwrap(), span);
        assert_eq!(DurationExact::from_time_like("0:00:01.5").unwrap().to_string(), "1.5s");

        let long = exact(DurationParts::default().with_days(30.0));
        assert_eq!(long.to_time_like(), "500:00:00.000000");

        assert!(DurationExact::from_time_like("1:60:00").is_err());
        assert!(DurationExact::from_time_like("1:00").is_err());
    }

    #[test]
    fn test_std_interop() {
        let span = exact(DurationParts::default().with_seconds(90.25));
        let std: std::time::Duration = span.into();
        assert_eq!(std, std::time::Duration::from_millis(90_250));
        assert_eq!(DurationExact::try_from(std).unwrap(), span);
        assert!(DurationExact::try_from(std::time::Duration::from_secs(u64::MAX)).is_err());
    }

    #[test]
    fn test_wire() {
        assert_eq!(DurationExact::BITS, 64);
        let max = DurationExact::max();
        let packed = max.to_packed().unwrap();
        assert_eq!(packed.len(), 8);
        let back = DurationExact::from_packed(&packed).unwrap();
        back.validate().unwrap();
        assert_eq!(back, max);

        // 27 one bits decode to more days than allowed
        let over = DurationExact::from_packed(&[0xFF, 0xFF, 0xFF, 0xE0, 0, 0, 0, 0]).unwrap();
        assert!(matches!(over.validate(), Err(Error::AtMost { .. })));
    }

    #[test]
    fn test_huge_sum_drops_microseconds() {
        // past 2^53us the single microsecond cannot be represented and is lost
        let span = exact(DurationParts::default().with_hours(3_000_000.0).with_micros(1.0));
        assert_eq!(span.to_string(), "125000d");
        assert_eq!(span.microseconds(), 0);
    }

    #[test]
    fn test_serde() {
        let span = exact(DurationParts::default().with_days(3.0).with_seconds(0.5));
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(json, "\"3d0.5s\"");
        let back: DurationExact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }
}
