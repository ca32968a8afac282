//! Text grammar shared by every parser: strictness, the `now` literal, fixed and variable width
//! numbers, and the unit-suffix and ISO 8601 duration forms.

use std::fmt;

use derive_more::Display;

use crate::calendar::Civil;
use crate::clock::{Clock, SystemClock};
use crate::consts::NOW;
use crate::cursor::Cursor;
use crate::duration::DurationParts;
use crate::{Error, Result};

/// How much a parser tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum ParseMode {
    /// Exact zero-padded digit counts and the canonical delimiters only.
    #[display(fmt = "strict")]
    Strict,
    /// Short numbers, alternate delimiters, month names, fractions on any duration unit.
    #[default]
    #[display(fmt = "lenient")]
    Lenient,
}

/// Parsing configuration: a [`ParseMode`] and the clock that resolves `now`.
#[derive(Clone, Copy)]
pub struct Grammar<'c> {
    mode:  ParseMode,
    clock: &'c dyn Clock,
}

impl Grammar<'static> {
    /// Strict grammar reading `now` from the system clock.
    pub const fn strict() -> Self {
        Self::new(ParseMode::Strict, &SystemClock)
    }

    /// Lenient grammar reading `now` from the system clock.
    pub const fn lenient() -> Self {
        Self::new(ParseMode::Lenient, &SystemClock)
    }
}

impl Default for Grammar<'static> {
    fn default() -> Self {
        Self::lenient()
    }
}

impl fmt::Debug for Grammar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar").field("mode", &self.mode).finish_non_exhaustive()
    }
}

impl<'c> Grammar<'c> {
    pub const fn new(mode: ParseMode, clock: &'c dyn Clock) -> Self {
        Self { mode, clock }
    }

    /// Same mode, different clock.
    pub const fn with_clock<'d>(self, clock: &'d dyn Clock) -> Grammar<'d> {
        Grammar { mode: self.mode, clock }
    }

    pub const fn mode(&self) -> ParseMode {
        self.mode
    }

    pub const fn is_strict(&self) -> bool {
        matches!(self.mode, ParseMode::Strict)
    }

    pub fn clock(&self) -> &'c dyn Clock {
        self.clock
    }

    /// Consumes a case-insensitive `now` and reads the clock.
    pub(crate) fn read_now(&self, cur: &mut Cursor<'_>) -> Option<Civil> {
        cur.eat_ignore_case(NOW).then(|| self.clock.civil())
    }

    /// Reads an unsigned number: exactly `width` digits when strict, 1 to `width` when lenient.
    pub(crate) fn read_number(&self, cur: &mut Cursor<'_>, width: usize) -> Option<u32> {
        let min = if self.is_strict() { width } else { 1 };
        cur.take_digits(min, width).map(digits_value)
    }

    /// Reads the digits after a decimal point as a count of `10^-width` units.
    ///
    /// Strict takes exactly `width` digits; lenient takes 1 to `width`, so `.5` is half a unit of
    /// the next larger field.
    pub(crate) fn read_fraction(&self, cur: &mut Cursor<'_>, width: usize) -> Option<u32> {
        let min = if self.is_strict() { width } else { 1 };
        let digits = cur.take_digits(min, width)?;
        Some(digits_value(digits) * 10u32.pow((width - digits.len()) as u32))
    }
}

/// Value of a run of at most nine ASCII digits.
pub(crate) fn digits_value(digits: &str) -> u32 {
    debug_assert!(digits.len() <= 9);
    digits.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// Runs `read` over the whole of `text` (surrounding whitespace ignored). Any leftover input is a
/// content error.
pub(crate) fn parse_all<T>(
    text: &str,
    field: &'static str,
    read: impl FnOnce(&mut Cursor<'_>) -> Result<T>,
) -> Result<T> {
    let mut cur = Cursor::new(text.trim());
    let result = cur.transaction(|cur| {
        let value = read(cur)?;
        if cur.is_empty() {
            Ok(value)
        } else {
            Err(Error::content(field, text))
        }
    });
    if let Err(err) = &result {
        log::debug!("rejected {field} {text:?}: {err}");
    }
    result
}

const UNITS: [char; 6] = ['y', 'm', 'd', 'h', 'i', 's'];

/// Reads a duration in unit-suffix form (`1y2.5m3d4h5i6.000001s`) or, when lenient, ISO 8601
/// form (`P1Y2MT3H`).
///
/// Units appear at most once each and in descending size. Strict mode only allows lowercase units
/// and fractions on months and seconds.
pub(crate) fn read_duration_parts(
    cur: &mut Cursor<'_>,
    grammar: &Grammar<'_>,
    field: &'static str,
) -> Result<DurationParts> {
    let input = cur.rest();
    if !grammar.is_strict() && cur.eat_if(|c| c.eq_ignore_ascii_case(&'P')).is_some() {
        return read_iso_duration(cur, input, field);
    }

    let mut parts = DurationParts::default();
    let mut next_rank = 0;
    let mut seen = false;
    loop {
        if !grammar.is_strict() {
            cur.trim_start();
        }
        if cur.is_empty() || !cur.peek().is_some_and(|c| c.is_ascii_digit()) {
            break;
        }
        let (value, fraction_digits) = read_decimal(cur).ok_or_else(|| Error::content(field, input))?;
        let unit = cur
            .eat_if(|c| if grammar.is_strict() { c.is_ascii_lowercase() } else { c.is_ascii_alphabetic() })
            .map(|c| c.to_ascii_lowercase());
        let rank = UNITS
            .iter()
            .position(|&u| Some(u) == unit)
            .filter(|&rank| rank >= next_rank)
            .ok_or_else(|| Error::content(field, input))?;
        if grammar.is_strict() && fraction_digits > 0 {
            let fraction_allowed = match UNITS[rank] {
                'm' => true,
                's' => fraction_digits <= 6,
                _ => false,
            };
            if !fraction_allowed {
                return Err(Error::content(field, input));
            }
        }
        parts.set(rank, value);
        next_rank = rank + 1;
        seen = true;
    }

    if seen {
        Ok(parts)
    } else {
        Err(Error::content(field, input))
    }
}

fn read_iso_duration(cur: &mut Cursor<'_>, input: &str, field: &'static str) -> Result<DurationParts> {
    // Y M W D, then after T: H M S
    const DATE_UNITS: [char; 4] = ['Y', 'M', 'W', 'D'];
    const TIME_UNITS: [char; 3] = ['H', 'M', 'S'];

    let mut parts = DurationParts::default();
    let mut next_rank = 0;
    let mut in_time = false;
    let mut seen = false;
    let mut time_seen = false;
    while !cur.is_empty() {
        if !in_time && cur.eat_if(|c| c.eq_ignore_ascii_case(&'T')).is_some() {
            in_time = true;
            next_rank = DATE_UNITS.len();
            continue;
        }
        let (value, _) = read_decimal(cur).ok_or_else(|| Error::content(field, input))?;
        let unit = cur
            .eat_if(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .ok_or_else(|| Error::content(field, input))?;
        let rank = if in_time {
            TIME_UNITS.iter().position(|&u| u == unit).map(|i| i + DATE_UNITS.len())
        } else {
            DATE_UNITS.iter().position(|&u| u == unit)
        }
        .filter(|&rank| rank >= next_rank)
        .ok_or_else(|| Error::content(field, input))?;

        match rank {
            0 => parts.years = value,
            1 => parts.months = value,
            2 => parts.days += value * 7.0,
            3 => parts.days += value,
            4 => parts.hours = value,
            5 => parts.minutes = value,
            _ => parts.seconds = value,
        }
        next_rank = rank + 1;
        seen = true;
        time_seen |= in_time;
    }

    // a bare `P`, or a `T` with nothing after it
    if !seen || (in_time && !time_seen) {
        return Err(Error::content(field, input));
    }
    Ok(parts)
}

/// Reads `digits[.digits]`, returning the value and the number of fraction digits.
fn read_decimal(cur: &mut Cursor<'_>) -> Option<(f64, usize)> {
    let start = cur.mark();
    cur.take_digits(1, usize::MAX)?;
    let mut fraction_digits = 0;
    let dot = cur.mark();
    if cur.eat('.') {
        match cur.take_digits(1, usize::MAX) {
            Some(fraction) => fraction_digits = fraction.len(),
            None => cur.reset_to(dot),
        }
    }
    let value = cur.since(start).parse::<f64>().ok()?;
    Some((value, fraction_digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn test_read_number() {
        let strict = Grammar::strict();
        let lenient = Grammar::lenient();

        let mut cur = Cursor::new("7:");
        assert_eq!(strict.read_number(&mut cur, 2), None);
        assert_eq!(lenient.read_number(&mut cur, 2), Some(7));

        let mut cur = Cursor::new("0712");
        assert_eq!(strict.read_number(&mut cur, 2), Some(7));
        assert_eq!(strict.read_number(&mut cur, 2), Some(12));
    }

    #[test]
    fn test_read_fraction() {
        let mut cur = Cursor::new("5");
        assert_eq!(Grammar::lenient().read_fraction(&mut cur, 6), Some(500_000));

        let mut cur = Cursor::new("5");
        assert_eq!(Grammar::strict().read_fraction(&mut cur, 6), None);

        let mut cur = Cursor::new("000123");
        assert_eq!(Grammar::strict().read_fraction(&mut cur, 6), Some(123));
    }

    #[test]
    fn test_now_uses_injected_clock() {
        let clock = FixedClock::from_unix_seconds(0);
        let grammar = Grammar::new(ParseMode::Strict, &clock);
        let mut cur = Cursor::new("NOW");
        let civil = grammar.read_now(&mut cur).unwrap();
        assert_eq!((civil.year, civil.month, civil.day), (1970, 1, 1));

        let mut cur = Cursor::new("later");
        assert!(grammar.read_now(&mut cur).is_none());
        assert_eq!(cur.mark(), 0);
    }

    #[test]
    fn test_parse_all_rejects_leftovers() {
        let err = parse_all("12x", "hour", |cur| {
            Grammar::lenient().read_number(cur, 2).ok_or_else(|| Error::content("hour", cur.rest()))
        })
        .unwrap_err();
        assert_eq!(err, Error::content("hour", "12x"));

        let value = parse_all("  12 ", "hour", |cur| {
            Grammar::lenient().read_number(cur, 2).ok_or_else(|| Error::content("hour", cur.rest()))
        });
        assert_eq!(value, Ok(12));
    }

    #[test]
    fn test_unit_suffix_form() {
        let mut cur = Cursor::new("1y2.5m3d4h5i6.000001s");
        let parts = read_duration_parts(&mut cur, &Grammar::strict(), "duration").unwrap();
        assert_eq!(
            parts,
            DurationParts {
                years:   1.0,
                months:  2.5,
                days:    3.0,
                hours:   4.0,
                minutes: 5.0,
                seconds: 6.000_001,
                micros:  0.0,
            }
        );
        assert!(cur.is_empty());
    }

    #[test]
    fn test_unit_suffix_rules() {
        struct TestCase {
            input:  &'static str,
            strict: bool,
            ok:     bool,
        }

        let cases = [
            TestCase {
                input:  "1D 2H",
                strict: false,
                ok:     true,
            },
            TestCase {
                input:  "1D",
                strict: true,
                ok:     false,
            },
            TestCase {
                input:  "1.5d",
                strict: false,
                ok:     true,
            },
            TestCase {
                input:  "1.5d",
                strict: true,
                ok:     false,
            },
            TestCase {
                input:  "2h1d",
                strict: false,
                ok:     false,
            },
            TestCase {
                input:  "1d1d",
                strict: false,
                ok:     false,
            },
            TestCase {
                input:  "1x",
                strict: false,
                ok:     false,
            },
            TestCase {
                input:  "5",
                strict: false,
                ok:     false,
            },
            TestCase {
                input:  "1.0000001s",
                strict: true,
                ok:     false,
            },
        ];

        for case in &cases {
            let grammar = if case.strict { Grammar::strict() } else { Grammar::lenient() };
            let result = parse_all(case.input, "duration", |cur| read_duration_parts(cur, &grammar, "duration"));
            assert_eq!(result.is_ok(), case.ok, "{:?} strict={}", case.input, case.strict);
        }
    }

    #[test]
    fn test_iso_form() {
        let parse = |text| parse_all(text, "duration", |cur| read_duration_parts(cur, &Grammar::lenient(), "duration"));

        let parts = parse("P1Y2M1W3DT4H5M6.5S").unwrap();
        assert_eq!(
            parts,
            DurationParts {
                years:   1.0,
                months:  2.0,
                days:    10.0,
                hours:   4.0,
                minutes: 5.0,
                seconds: 6.5,
                micros:  0.0,
            }
        );

        let parts = parse("pt30m").unwrap();
        assert_eq!(parts.minutes, 30.0);
        assert_eq!(parts.months, 0.0);

        assert!(parse("P").is_err());
        assert!(parse("PT").is_err());
        assert!(parse("P1H").is_err());
        assert!(parse("PT1D").is_err());
        assert!(parse("P1D2Y").is_err());
    }
}
