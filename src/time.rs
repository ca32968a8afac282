//! Times of day at microsecond and millisecond precision.
//!
//! Cell layout: hour at byte 0, minute at 1, second at 2, the fraction from byte 3 on (3 bytes of
//! microseconds or 2 bytes of milliseconds).

use std::fmt;
use std::str::FromStr;

use crate::bits::{BitPacked, BitReader, BitWriter};
use crate::calendar::{Civil, unix_micros_from_f64};
use crate::clock::{Clock, SystemClock};
use crate::consts::{
    FRACTION_SEPARATOR, MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MILLI, MICROS_PER_MINUTE,
    MICROS_PER_SECOND, TIME_SEPARATOR,
};
use crate::cursor::Cursor;
use crate::grammar::{self, Grammar, ParseMode};
use crate::prelude::text_serde;
use crate::types::{Component, Hour, Microsecond, Millisecond, Minute, Second};
use crate::{Error, Result};

const HOUR_AT: usize = 0;
const MINUTE_AT: usize = 1;
const SECOND_AT: usize = 2;
const FRACTION_AT: usize = 3;

macro_rules! time_of_day {
    (
        $(#[$doc:meta])*
        $name:ident {
            fraction: $frac:ident($frac_int:ty),
            getter: $getter:ident,
            storage: $storage:literal,
            digits: $digits:literal,
            undelimited: $undelimited:literal,
            micros_per_unit: $per:expr,
        }
    ) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $storage]);

        impl $name {
            const NAME: &'static str = "time";
            pub(crate) const STORAGE: usize = $storage;

            /// Creates a time of day, validating every field.
            ///
            /// # Errors
            /// Returns `Error::OutOfRange` naming the first field out of range.
            pub fn new(hour: u8, minute: u8, second: u8, $getter: $frac_int) -> Result<Self> {
                Ok(Self::from_components(
                    Hour::new(hour)?,
                    Minute::new(minute)?,
                    Second::new(second)?,
                    $frac::new($getter)?,
                ))
            }

            pub fn from_components(hour: Hour, minute: Minute, second: Second, $getter: $frac) -> Self {
                let mut cell = [0; $storage];
                hour.store(&mut cell[HOUR_AT..]);
                minute.store(&mut cell[MINUTE_AT..]);
                second.store(&mut cell[SECOND_AT..]);
                $getter.store(&mut cell[FRACTION_AT..]);
                Self(cell)
            }

            /// Midnight.
            pub const fn midnight() -> Self {
                Self([0; $storage])
            }

            pub fn hour(&self) -> Hour {
                Hour::load(&self.0[HOUR_AT..])
            }

            pub fn minute(&self) -> Minute {
                Minute::load(&self.0[MINUTE_AT..])
            }

            pub fn second(&self) -> Second {
                Second::load(&self.0[SECOND_AT..])
            }

            pub fn $getter(&self) -> $frac {
                $frac::load(&self.0[FRACTION_AT..])
            }

            /// Microseconds since midnight.
            pub fn to_micros_of_day(&self) -> u64 {
                u64::from(self.hour().get()) * MICROS_PER_HOUR
                    + u64::from(self.minute().get()) * MICROS_PER_MINUTE
                    + u64::from(self.second().get()) * MICROS_PER_SECOND
                    + u64::from(self.$getter().get()) * $per
            }

            /// Time of day `micros` after midnight, truncated to this type's precision.
            ///
            /// # Errors
            /// Returns `Error::OutOfRange` if `micros` is a day or more.
            pub fn from_micros_of_day(micros: u64) -> Result<Self> {
                if micros >= MICROS_PER_DAY {
                    return Err(Error::out_of_range(
                        "microseconds of day",
                        micros.min(i64::MAX as u64) as i64,
                        0,
                        (MICROS_PER_DAY - 1) as i64,
                    ));
                }
                Ok(Self::of_day(micros))
            }

            /// `micros` must be below one day.
            pub(crate) fn of_day(micros: u64) -> Self {
                debug_assert!(micros < MICROS_PER_DAY);
                Self::from_components(
                    Hour::from_raw((micros / MICROS_PER_HOUR) as u32),
                    Minute::from_raw((micros % MICROS_PER_HOUR / MICROS_PER_MINUTE) as u32),
                    Second::from_raw((micros % MICROS_PER_MINUTE / MICROS_PER_SECOND) as u32),
                    $frac::from_raw((micros % MICROS_PER_SECOND / $per) as u32),
                )
            }

            pub(crate) fn from_civil(civil: &Civil) -> Self {
                Self::of_day(
                    u64::from(civil.hour) * MICROS_PER_HOUR
                        + u64::from(civil.minute) * MICROS_PER_MINUTE
                        + u64::from(civil.second) * MICROS_PER_SECOND
                        + u64::from(civil.micro),
                )
            }

            /// Current UTC time of day according to `clock`.
            pub fn now(clock: &dyn Clock) -> Self {
                Self::from_civil(&clock.civil())
            }

            pub fn from_unix_seconds(seconds: f64) -> Result<Self> {
                Ok(Self::from_unix_micros(unix_micros_from_f64(seconds, 1e6)?))
            }

            pub fn from_unix_millis(millis: f64) -> Result<Self> {
                Ok(Self::from_unix_micros(unix_micros_from_f64(millis, 1e3)?))
            }

            /// Time of day of a Unix instant.
            pub fn from_unix_micros(micros: i64) -> Self {
                Self::of_day(micros.rem_euclid(MICROS_PER_DAY as i64) as u64)
            }

            /// The digits of the ISO form as one integer (`hhmmss` followed by the fraction).
            /// Orders like the time itself.
            pub fn value(&self) -> u64 {
                let hms = (u64::from(self.hour().get()) * 100 + u64::from(self.minute().get())) * 100
                    + u64::from(self.second().get());
                hms * 10u64.pow($digits) + u64::from(self.$getter().get())
            }

            /// Loads the time stored at the start of `cell`.
            pub(crate) fn load(cell: &[u8]) -> Self {
                let mut bytes = [0; $storage];
                bytes.copy_from_slice(&cell[..$storage]);
                Self(bytes)
            }

            pub(crate) fn store(self, cell: &mut [u8]) {
                cell[..$storage].copy_from_slice(&self.0);
            }

            pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
                Self::parse_with(text, &Grammar::new(mode, &SystemClock))
            }

            pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
                grammar::parse_all(text, Self::NAME, |cur| Self::read(cur, grammar))
            }

            /// `hh:mm:ss.fff…`, or undelimited `hhmmssfff…`. Lenient also takes `hh:mm`,
            /// `hh:mm:ss`, a shorter fraction, one-digit fields and undelimited `hhmmss`.
            pub(crate) fn read(cur: &mut Cursor<'_>, grammar: &Grammar<'_>) -> Result<Self> {
                if let Some(civil) = grammar.read_now(cur) {
                    return Ok(Self::from_civil(&civil));
                }
                cur.transaction(|cur| {
                    let input = cur.rest();
                    let bad = || Error::content(Self::NAME, input);
                    let run = cur.digit_run();
                    if run == $undelimited || (!grammar.is_strict() && run == 6) {
                        let mut field = |width| cur.take_digits(width, width).map(grammar::digits_value);
                        let (hour, minute, second) = (field(2), field(2), field(2));
                        let fraction = if run == 6 { Some(0) } else { field($digits) };
                        return match (hour, minute, second, fraction) {
                            (Some(h), Some(m), Some(s), Some(f)) => {
                                Self::new(h as u8, m as u8, s as u8, f as $frac_int)
                            }
                            _ => Err(bad()),
                        };
                    }

                    let hour = grammar.read_number(cur, 2).ok_or_else(bad)?;
                    if !cur.eat(TIME_SEPARATOR) {
                        return Err(bad());
                    }
                    let minute = grammar.read_number(cur, 2).ok_or_else(bad)?;
                    let mut second = 0;
                    let mut fraction = 0;
                    if cur.eat(TIME_SEPARATOR) {
                        second = grammar.read_number(cur, 2).ok_or_else(bad)?;
                        if cur.eat(FRACTION_SEPARATOR) {
                            fraction = grammar.read_fraction(cur, $digits).ok_or_else(bad)?;
                        } else if grammar.is_strict() {
                            return Err(bad());
                        }
                    } else if grammar.is_strict() {
                        return Err(bad());
                    }
                    Self::new(hour as u8, minute as u8, second as u8, fraction as $frac_int)
                })
            }

            /// `hh:mm:ss` and the zero-padded fraction.
            pub fn to_iso_string(&self) -> String {
                format!(
                    "{}{TIME_SEPARATOR}{}{TIME_SEPARATOR}{}{FRACTION_SEPARATOR}{}",
                    self.hour().to_iso_string(),
                    self.minute().to_iso_string(),
                    self.second().to_iso_string(),
                    self.$getter().to_iso_string(),
                )
            }
        }

        impl BitPacked for $name {
            const BITS: u32 = Hour::BITS + Minute::BITS + Second::BITS + $frac::BITS;

            fn serialize(&self, writer: &mut BitWriter<'_>) -> Result<()> {
                self.hour().serialize(writer)?;
                self.minute().serialize(writer)?;
                self.second().serialize(writer)?;
                self.$getter().serialize(writer)
            }

            fn deserialize(reader: &mut BitReader<'_>) -> Result<Self> {
                Ok(Self::from_components(
                    Hour::deserialize(reader)?,
                    Minute::deserialize(reader)?,
                    Second::deserialize(reader)?,
                    $frac::deserialize(reader)?,
                ))
            }

            fn validate(&self) -> Result<()> {
                self.hour().validate()?;
                self.minute().validate()?;
                self.second().validate()?;
                self.$getter().validate()
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s, ParseMode::Lenient)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_iso_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }

        text_serde!($name);
    };
}

time_of_day! {
    /// A time of day with microsecond precision.
    TimeOnly {
        fraction: Microsecond(u32),
        getter: microsecond,
        storage: 6,
        digits: 6,
        undelimited: 12,
        micros_per_unit: 1,
    }
}

time_of_day! {
    /// A time of day with millisecond precision.
    TimeOnlyMs {
        fraction: Millisecond(u16),
        getter: millisecond,
        storage: 5,
        digits: 3,
        undelimited: 9,
        micros_per_unit: MICROS_PER_MILLI,
    }
}

impl From<TimeOnlyMs> for TimeOnly {
    fn from(time: TimeOnlyMs) -> Self {
        Self::of_day(time.to_micros_of_day())
    }
}

/// Drops the sub-millisecond part.
impl From<TimeOnly> for TimeOnlyMs {
    fn from(time: TimeOnly) -> Self {
        Self::of_day(time.to_micros_of_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn test_new_and_accessors() {
        let time = TimeOnly::new(13, 45, 30, 123_456).unwrap();
        assert_eq!(time.hour().get(), 13);
        assert_eq!(time.minute().get(), 45);
        assert_eq!(time.second().get(), 30);
        assert_eq!(time.microsecond().get(), 123_456);
        assert_eq!(time.to_iso_string(), "13:45:30.123456");
        assert_eq!(time.value(), 134_530_123_456);

        assert!(matches!(TimeOnly::new(24, 0, 0, 0), Err(Error::OutOfRange { field: "hour", .. })));
        assert!(matches!(TimeOnlyMs::new(0, 0, 0, 1000), Err(Error::OutOfRange { field: "millisecond", .. })));
    }

    #[test]
    fn test_micros_of_day() {
        let time = TimeOnly::from_micros_of_day(MICROS_PER_DAY - 1).unwrap();
        assert_eq!(time.to_iso_string(), "23:59:59.999999");
        assert_eq!(time.to_micros_of_day(), MICROS_PER_DAY - 1);
        assert!(TimeOnly::from_micros_of_day(MICROS_PER_DAY).is_err());

        let time = TimeOnlyMs::from_micros_of_day(1_999).unwrap();
        assert_eq!(time.millisecond().get(), 1);
        assert_eq!(time.to_micros_of_day(), 1_000);
    }

    #[test]
    fn test_precision_conversions() {
        let micro = TimeOnly::new(1, 2, 3, 456_789).unwrap();
        let milli = TimeOnlyMs::from(micro);
        assert_eq!(milli.to_iso_string(), "01:02:03.456");
        assert_eq!(TimeOnly::from(milli).to_iso_string(), "01:02:03.456000");
    }

    #[test]
    fn test_from_unix() {
        assert_eq!(TimeOnly::from_unix_micros(-1).to_iso_string(), "23:59:59.999999");
        assert_eq!(TimeOnly::from_unix_seconds(90.5).unwrap().to_iso_string(), "00:01:30.500000");
        assert_eq!(TimeOnlyMs::from_unix_millis(86_400_001.0).unwrap().to_iso_string(), "00:00:00.001");

        let clock = FixedClock(1_705_326_330_123_456);
        assert_eq!(TimeOnly::now(&clock).to_iso_string(), "13:45:30.123456");
        assert_eq!(TimeOnlyMs::now(&clock).to_iso_string(), "13:45:30.123");
    }

    #[test]
    fn test_parse() {
        struct TestCase {
            input:    &'static str,
            mode:     ParseMode,
            expected: Option<&'static str>,
        }

        let cases = [
            TestCase {
                input:    "13:45:30.123456",
                mode:     ParseMode::Strict,
                expected: Some("13:45:30.123456"),
            },
            TestCase {
                input:    "134530123456",
                mode:     ParseMode::Strict,
                expected: Some("13:45:30.123456"),
            },
            TestCase {
                input:    "13:45:30",
                mode:     ParseMode::Strict,
                expected: None,
            },
            TestCase {
                input:    "13:45:30.5",
                mode:     ParseMode::Strict,
                expected: None,
            },
            TestCase {
                input:    "13:45:30.5",
                mode:     ParseMode::Lenient,
                expected: Some("13:45:30.500000"),
            },
            TestCase {
                input:    "9:05",
                mode:     ParseMode::Lenient,
                expected: Some("09:05:00.000000"),
            },
            TestCase {
                input:    "134530",
                mode:     ParseMode::Lenient,
                expected: Some("13:45:30.000000"),
            },
            TestCase {
                input:    "134530",
                mode:     ParseMode::Strict,
                expected: None,
            },
            TestCase {
                input:    "24:00",
                mode:     ParseMode::Lenient,
                expected: None,
            },
            TestCase {
                input:    "13-45",
                mode:     ParseMode::Lenient,
                expected: None,
            },
        ];

        for case in &cases {
            let parsed = TimeOnly::parse(case.input, case.mode).ok().map(|t| t.to_iso_string());
            assert_eq!(parsed.as_deref(), case.expected, "{:?} {}", case.input, case.mode);
        }
    }

    #[test]
    fn test_parse_ms() {
        assert_eq!(TimeOnlyMs::parse("13:45:30.123", ParseMode::Strict).unwrap().value(), 134_530_123);
        assert_eq!(TimeOnlyMs::parse("134530123", ParseMode::Strict).unwrap().value(), 134_530_123);
        assert!(TimeOnlyMs::parse("13:45:30.123456", ParseMode::Strict).is_err());
        assert_eq!(TimeOnlyMs::parse("13:45:30.1", ParseMode::Lenient).unwrap().millisecond().get(), 100);
    }

    #[test]
    fn test_parse_failure_leaves_cursor() {
        let mut cur = Cursor::new("13:xx");
        assert!(TimeOnly::read(&mut cur, &Grammar::lenient()).is_err());
        assert_eq!(cur.mark(), 0);
    }

    #[test]
    fn test_wire() {
        let time = TimeOnly::new(23, 59, 59, 999_999).unwrap();
        assert_eq!(TimeOnly::BITS, 37);
        let packed = time.to_packed().unwrap();
        assert_eq!(packed.len(), 5);
        let back = TimeOnly::from_packed(&packed).unwrap();
        back.validate().unwrap();
        assert_eq!(back, time);

        assert_eq!(TimeOnlyMs::BITS, 27);
        // hour 31 is representable on the wire but invalid
        let bad = TimeOnlyMs::from_packed(&[0xF8, 0, 0, 0]).unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_ordering() {
        let a = TimeOnly::new(9, 59, 59, 999_999).unwrap();
        let b = TimeOnly::new(10, 0, 0, 0).unwrap();
        assert!(a < b);
        assert!(a.value() < b.value());
        assert_eq!(TimeOnly::midnight(), TimeOnly::default());
    }

    #[test]
    fn test_serde() {
        let time = TimeOnly::new(7, 8, 9, 10).unwrap();
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"07:08:09.000010\"");
        let back: TimeOnly = serde_json::from_str(&json).unwrap();
        assert_eq!(back, time);
        assert!(serde_json::from_str::<TimeOnly>("\"25:00\"").is_err());
        assert_eq!(format!("{time:?}"), "TimeOnly(07:08:09.000010)");
    }
}
