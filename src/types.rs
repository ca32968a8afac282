use crate::bits::{BitPacked, BitReader, BitWriter};
use crate::calendar::{Civil, MONTH_NAMES, last_day_of_month, unix_micros_from_f64};
use crate::cell;
use crate::clock::{Clock, SystemClock};
use crate::consts::{
    MAX_DAY, MAX_HOUR, MAX_MICROSECOND, MAX_MILLISECOND, MAX_MINUTE, MAX_MONTH, MAX_SECOND,
    MAX_YEAR, MIN_DAY, MIN_YEAR,
};
use crate::cursor::Cursor;
use crate::grammar::{self, Grammar, ParseMode};
use crate::{Error, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage contract shared by the scalar components.
///
/// A component is stored as `raw = value - MIN`, big-endian in `STORAGE` bytes, so the minimum of
/// every component is stored as zero and byte order matches numeric order.
pub(crate) trait Component: Copy {
    const NAME: &'static str;
    const STORAGE: usize;
    const MIN: i64;
    const MAX: i64;

    /// Stored value, not range checked.
    fn raw(self) -> u32;

    /// Builds a component from a stored value without range checks.
    fn from_raw(raw: u32) -> Self;

    fn value(self) -> i64 {
        i64::from(self.raw()) + Self::MIN
    }

    fn load(bytes: &[u8]) -> Self {
        Self::from_raw(cell::get(bytes, Self::STORAGE))
    }

    fn store(self, bytes: &mut [u8]) {
        cell::put(bytes, Self::STORAGE, self.raw());
    }

    fn check(self) -> Result<()> {
        if self.value() > Self::MAX {
            return Err(Error::out_of_range(Self::NAME, self.value(), Self::MIN, Self::MAX));
        }
        Ok(())
    }
}

/// Wires a component's storage contract to its `BITS`-wide wire form.
macro_rules! component_bits {
    ($ty:ty, $bits:literal) => {
        impl BitPacked for $ty {
            const BITS: u32 = $bits;

            fn serialize(&self, writer: &mut BitWriter<'_>) -> Result<()> {
                writer.write_number_be(self.raw(), Self::BITS)
            }

            fn deserialize(reader: &mut BitReader<'_>) -> Result<Self> {
                Ok(Self::from_raw(reader.read_number_be(Self::BITS)?))
            }

            fn validate(&self) -> Result<()> {
                self.check()
            }
        }
    };
}

/// A year in `MIN_YEAR..=MAX_YEAR` (-10000..=22767), stored as its Holocene number
/// (`year + 10000`) so every valid year is non-negative.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Year([u8; 2]);

impl Component for Year {
    const NAME: &'static str = "year";
    const STORAGE: usize = 2;
    const MIN: i64 = MIN_YEAR as i64;
    const MAX: i64 = MAX_YEAR as i64;

    fn raw(self) -> u32 {
        cell::get(&self.0, Self::STORAGE)
    }

    fn from_raw(raw: u32) -> Self {
        let mut cell = [0; 2];
        cell::put(&mut cell, Self::STORAGE, raw);
        Self(cell)
    }
}

component_bits!(Year, 15);

impl Year {
    /// Creates a new Year, validating that it's within `MIN_YEAR..=MAX_YEAR`
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` otherwise.
    pub fn new(value: i32) -> Result<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&value) {
            return Err(Error::out_of_range(Self::NAME, value, MIN_YEAR, MAX_YEAR));
        }
        Ok(Self::from_raw((value - MIN_YEAR) as u32))
    }

    /// Returns the year value
    #[inline]
    pub fn get(self) -> i32 {
        self.value() as i32
    }

    /// Returns the stored Holocene year (`year + 10000`)
    pub fn holocene(self) -> u16 {
        self.raw() as u16
    }

    /// Creates a year from its Holocene number.
    pub fn from_holocene(holocene: u16) -> Result<Self> {
        Self::new(i32::from(holocene) + MIN_YEAR)
    }

    /// Current year according to `clock`.
    pub fn now(clock: &dyn Clock) -> Result<Self> {
        Self::new(clock.civil().year)
    }

    pub fn from_unix_seconds(seconds: f64) -> Result<Self> {
        Self::from_unix_micros(unix_micros_from_f64(seconds, 1e6)?)
    }

    pub fn from_unix_millis(millis: f64) -> Result<Self> {
        Self::from_unix_micros(unix_micros_from_f64(millis, 1e3)?)
    }

    pub fn from_unix_micros(micros: i64) -> Result<Self> {
        Self::new(Civil::from_unix_micros(micros).year)
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        Self::parse_with(text, &Grammar::new(mode, &SystemClock))
    }

    pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
        grammar::parse_all(text, Self::NAME, |cur| Self::read(cur, grammar))
    }

    /// Strict: four digits, `+` and five digits, or `-` and four or five digits.
    /// Lenient: an optional sign and one to five digits.
    pub(crate) fn read(cur: &mut Cursor<'_>, grammar: &Grammar<'_>) -> Result<Self> {
        cur.transaction(|cur| {
            if let Some(civil) = grammar.read_now(cur) {
                return Self::new(civil.year);
            }
            let input = cur.rest();
            let sign = cur.eat_if(|c| c == '+' || c == '-');
            let (min, max) = match (grammar.is_strict(), sign) {
                (false, _) => (1, 5),
                (true, None) => (4, 4),
                (true, Some('+')) => (5, 5),
                (true, Some(_)) => (4, 5),
            };
            let digits = cur
                .take_digits(min, max)
                .ok_or_else(|| Error::content(Self::NAME, input))?;
            let magnitude = grammar::digits_value(digits) as i32;
            Self::new(if sign == Some('-') { -magnitude } else { magnitude })
        })
    }

    /// Four digits, `-` for negative years, `+` for years past 9999.
    pub fn to_iso_string(self) -> String {
        let year = self.get();
        if year < 0 {
            format!("-{:04}", -year)
        } else if year > 9999 {
            format!("+{year}")
        } else {
            format!("{year:04}")
        }
    }
}

impl TryFrom<i32> for Year {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Year> for i32 {
    fn from(year: Year) -> Self {
        year.get()
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl fmt::Debug for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Year").field(&self.get()).finish()
    }
}

/// A month in `1..=12`, stored zero-based.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "u8", into = "u8")]
#[display(fmt = "{}", "self.get()")]
pub struct Month([u8; 1]);

impl Component for Month {
    const NAME: &'static str = "month";
    const STORAGE: usize = 1;
    const MIN: i64 = 1;
    const MAX: i64 = MAX_MONTH as i64;

    fn raw(self) -> u32 {
        u32::from(self.0[0])
    }

    fn from_raw(raw: u32) -> Self {
        Self([raw as u8])
    }
}

component_bits!(Month, 4);

impl Month {
    /// Creates a new Month, validating that it's within `1..=MAX_MONTH`
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` otherwise.
    pub fn new(value: u8) -> Result<Self> {
        if !(1..=MAX_MONTH).contains(&value) {
            return Err(Error::out_of_range(Self::NAME, value, 1, MAX_MONTH));
        }
        Ok(Self([value - 1]))
    }

    /// Returns the month value (January is 1)
    #[inline]
    pub fn get(self) -> u8 {
        self.value() as u8
    }

    /// English name of the month
    pub fn name(self) -> &'static str {
        MONTH_NAMES[usize::from(self.0[0]) % MONTH_NAMES.len()]
    }

    pub fn now(clock: &dyn Clock) -> Self {
        Self::from_civil(&clock.civil())
    }

    pub fn from_unix_seconds(seconds: f64) -> Result<Self> {
        Ok(Self::from_unix_micros(unix_micros_from_f64(seconds, 1e6)?))
    }

    pub fn from_unix_millis(millis: f64) -> Result<Self> {
        Ok(Self::from_unix_micros(unix_micros_from_f64(millis, 1e3)?))
    }

    pub fn from_unix_micros(micros: i64) -> Self {
        Self::from_civil(&Civil::from_unix_micros(micros))
    }

    const fn from_civil(civil: &Civil) -> Self {
        Self([civil.month - 1])
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        Self::parse_with(text, &Grammar::new(mode, &SystemClock))
    }

    pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
        grammar::parse_all(text, Self::NAME, |cur| Self::read(cur, grammar))
    }

    /// Two digits; lenient also takes one digit, an English month name or its first three
    /// letters, in any case.
    pub(crate) fn read(cur: &mut Cursor<'_>, grammar: &Grammar<'_>) -> Result<Self> {
        if let Some(civil) = grammar.read_now(cur) {
            return Ok(Self::from_civil(&civil));
        }
        if !grammar.is_strict() {
            let by_name = (1..=MAX_MONTH)
                .zip(MONTH_NAMES)
                .find(|(_, name)| cur.eat_ignore_case(name))
                .or_else(|| (1..=MAX_MONTH).zip(MONTH_NAMES).find(|(_, name)| cur.eat_ignore_case(&name[..3])));
            if let Some((month, _)) = by_name {
                return Self::new(month);
            }
        }
        let value = grammar
            .read_number(cur, 2)
            .ok_or_else(|| Error::content(Self::NAME, cur.rest()))?;
        Self::new(value as u8)
    }

    pub fn to_iso_string(self) -> String {
        format!("{:02}", self.get())
    }
}

impl TryFrom<u8> for Month {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> Self {
        month.get()
    }
}

impl fmt::Debug for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Month").field(&self.get()).finish()
    }
}

/// A day of month in `1..=31`, stored zero-based.
///
/// On its own a day is only checked against 31; [`Day::for_month`] and the date types check it
/// against the actual length of the month.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "u8", into = "u8")]
#[display(fmt = "{}", "self.get()")]
pub struct Day([u8; 1]);

impl Component for Day {
    const NAME: &'static str = "day";
    const STORAGE: usize = 1;
    const MIN: i64 = MIN_DAY as i64;
    const MAX: i64 = MAX_DAY as i64;

    fn raw(self) -> u32 {
        u32::from(self.0[0])
    }

    fn from_raw(raw: u32) -> Self {
        Self([raw as u8])
    }
}

component_bits!(Day, 5);

impl Day {
    /// Creates a new Day, validating that it's within `1..=31`
    ///
    /// # Errors
    /// Returns `Error::OutOfRange` otherwise.
    pub fn new(value: u8) -> Result<Self> {
        if !(MIN_DAY..=MAX_DAY).contains(&value) {
            return Err(Error::out_of_range(Self::NAME, value, MIN_DAY, MAX_DAY));
        }
        Ok(Self([value - 1]))
    }

    /// Creates a new Day, validating that it exists in the given year and month
    ///
    /// # Errors
    /// Returns `Error::InvalidDay` if the value is 0 or past the end of the month.
    pub fn for_month(value: u8, year: i32, month: u8) -> Result<Self> {
        Month::new(month)?;
        if value < MIN_DAY || value > last_day_of_month(month, Some(year)) {
            return Err(Error::InvalidDay {
                year,
                month,
                day: value,
            });
        }
        Ok(Self([value - 1]))
    }

    /// Returns the day value
    #[inline]
    pub fn get(self) -> u8 {
        self.value() as u8
    }

    pub fn now(clock: &dyn Clock) -> Self {
        Self::from_civil(&clock.civil())
    }

    pub fn from_unix_seconds(seconds: f64) -> Result<Self> {
        Ok(Self::from_unix_micros(unix_micros_from_f64(seconds, 1e6)?))
    }

    pub fn from_unix_millis(millis: f64) -> Result<Self> {
        Ok(Self::from_unix_micros(unix_micros_from_f64(millis, 1e3)?))
    }

    pub fn from_unix_micros(micros: i64) -> Self {
        Self::from_civil(&Civil::from_unix_micros(micros))
    }

    const fn from_civil(civil: &Civil) -> Self {
        Self([civil.day - 1])
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
        Self::parse_with(text, &Grammar::new(mode, &SystemClock))
    }

    pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
        grammar::parse_all(text, Self::NAME, |cur| Self::read(cur, grammar))
    }

    pub(crate) fn read(cur: &mut Cursor<'_>, grammar: &Grammar<'_>) -> Result<Self> {
        if let Some(civil) = grammar.read_now(cur) {
            return Ok(Self::from_civil(&civil));
        }
        let value = grammar
            .read_number(cur, 2)
            .ok_or_else(|| Error::content(Self::NAME, cur.rest()))?;
        Self::new(value as u8)
    }

    pub fn to_iso_string(self) -> String {
        format!("{:02}", self.get())
    }
}

impl TryFrom<u8> for Day {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Day> for u8 {
    fn from(day: Day) -> Self {
        day.get()
    }
}

impl fmt::Debug for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Day").field(&self.get()).finish()
    }
}

/// Time-of-day components: zero-based, stored as-is.
macro_rules! clock_component {
    (
        $(#[$doc:meta])*
        $name:ident($int:ty, $serde_int:tt) {
            name: $field:literal,
            storage: $storage:literal,
            bits: $bits:literal,
            max: $max:expr,
            digits: $digits:literal,
            from_civil: |$civil:ident| $from_civil:expr,
        }
    ) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
        #[serde(try_from = $serde_int, into = $serde_int)]
        #[display(fmt = "{}", "self.get()")]
        pub struct $name([u8; $storage]);

        impl Component for $name {
            const NAME: &'static str = $field;
            const STORAGE: usize = $storage;
            const MIN: i64 = 0;
            const MAX: i64 = $max as i64;

            fn raw(self) -> u32 {
                cell::get(&self.0, Self::STORAGE)
            }

            fn from_raw(raw: u32) -> Self {
                let mut cell = [0; $storage];
                cell::put(&mut cell, Self::STORAGE, raw);
                Self(cell)
            }
        }

        component_bits!($name, $bits);

        impl $name {
            /// # Errors
            /// Returns `Error::OutOfRange` if the value exceeds its maximum.
            pub fn new(value: $int) -> Result<Self> {
                if value > $max {
                    return Err(Error::out_of_range(Self::NAME, value, 0, $max));
                }
                Ok(Self::from_raw(u32::from(value)))
            }

            #[inline]
            pub fn get(self) -> $int {
                self.raw() as $int
            }

            pub fn now(clock: &dyn Clock) -> Self {
                Self::from_civil(&clock.civil())
            }

            pub fn from_unix_seconds(seconds: f64) -> Result<Self> {
                Ok(Self::from_unix_micros(unix_micros_from_f64(seconds, 1e6)?))
            }

            pub fn from_unix_millis(millis: f64) -> Result<Self> {
                Ok(Self::from_unix_micros(unix_micros_from_f64(millis, 1e3)?))
            }

            pub fn from_unix_micros(micros: i64) -> Self {
                Self::from_civil(&Civil::from_unix_micros(micros))
            }

            fn from_civil($civil: &Civil) -> Self {
                Self::from_raw(u32::from($from_civil))
            }

            pub fn parse(text: &str, mode: ParseMode) -> Result<Self> {
                Self::parse_with(text, &Grammar::new(mode, &SystemClock))
            }

            pub fn parse_with(text: &str, grammar: &Grammar<'_>) -> Result<Self> {
                grammar::parse_all(text, Self::NAME, |cur| Self::read(cur, grammar))
            }

            pub(crate) fn read(cur: &mut Cursor<'_>, grammar: &Grammar<'_>) -> Result<Self> {
                if let Some(civil) = grammar.read_now(cur) {
                    return Ok(Self::from_civil(&civil));
                }
                let value = grammar
                    .read_number(cur, $digits)
                    .ok_or_else(|| Error::content(Self::NAME, cur.rest()))?;
                Self::new(value as $int)
            }

            pub fn to_iso_string(self) -> String {
                format!("{:0width$}", self.get(), width = $digits)
            }
        }

        impl TryFrom<$int> for $name {
            type Error = Error;

            fn try_from(value: $int) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for $int {
            fn from(value: $name) -> Self {
                value.get()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }
    };
}

clock_component! {
    /// An hour of the day in `0..=23`.
    Hour(u8, "u8") {
        name: "hour",
        storage: 1,
        bits: 5,
        max: MAX_HOUR,
        digits: 2,
        from_civil: |civil| civil.hour,
    }
}

clock_component! {
    /// A minute in `0..=59`.
    Minute(u8, "u8") {
        name: "minute",
        storage: 1,
        bits: 6,
        max: MAX_MINUTE,
        digits: 2,
        from_civil: |civil| civil.minute,
    }
}

clock_component! {
    /// A second in `0..=59`. Leap seconds are not represented.
    Second(u8, "u8") {
        name: "second",
        storage: 1,
        bits: 6,
        max: MAX_SECOND,
        digits: 2,
        from_civil: |civil| civil.second,
    }
}

clock_component! {
    /// Milliseconds within a second, `0..=999`.
    Millisecond(u16, "u16") {
        name: "millisecond",
        storage: 2,
        bits: 10,
        max: MAX_MILLISECOND,
        digits: 3,
        from_civil: |civil| (civil.micro / 1_000) as u16,
    }
}

clock_component! {
    /// Microseconds within a second, `0..=999999`.
    Microsecond(u32, "u32") {
        name: "microsecond",
        storage: 3,
        bits: 20,
        max: MAX_MICROSECOND,
        digits: 6,
        from_civil: |civil| civil.micro,
    }
}
