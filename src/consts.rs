use crate::calendar::days_from_civil;

/// Minimum valid year (inclusive, proleptic Gregorian, astronomical numbering)
pub const MIN_YEAR: i32 = -10_000;
/// Maximum valid year (inclusive)
pub const MAX_YEAR: i32 = 22_767;
/// Offset added to a year for storage, so every valid year is non-negative
pub const HOLOCENE_OFFSET: i32 = 10_000;

/// Maximum valid month (December)
pub const MAX_MONTH: u8 = 12;
/// First day of month, used for lower bounds
pub const MIN_DAY: u8 = 1;
/// Longest month
pub const MAX_DAY: u8 = 31;

/// Month number for January
pub const JANUARY: u8 = 1;
/// Month number for February
pub const FEBRUARY: u8 = 2;
/// Month number for December
pub const DECEMBER: u8 = 12;

/// Days in February for leap years
pub const FEBRUARY_DAYS_LEAP: u8 = 29;

/// Maximum days in each month (index 0 is unused, months are 1-indexed)
/// February shows 28 days (non-leap year default)
pub const DAYS_IN_MONTH: [u8; 13] = [
    0,  // index 0 unused (months are 1-indexed)
    31, // January
    28, // February (non-leap, adjusted by is_leap_year check)
    31, // March
    30, // April
    31, // May
    30, // June
    31, // July
    31, // August
    30, // September
    31, // October
    30, // November
    31, // December
];

pub const MAX_HOUR: u8 = 23;
pub const MAX_MINUTE: u8 = 59;
pub const MAX_SECOND: u8 = 59;
pub const MAX_MILLISECOND: u16 = 999;
pub const MAX_MICROSECOND: u32 = 999_999;

pub const HOURS_PER_DAY: u64 = 24;
pub const MINUTES_PER_HOUR: u64 = 60;
pub const SECONDS_PER_MINUTE: u64 = 60;
pub const MONTHS_PER_YEAR: u64 = 12;

pub const MICROS_PER_MILLI: u64 = 1_000;
pub const MICROS_PER_SECOND: u64 = 1_000_000;
pub const MICROS_PER_MINUTE: u64 = MICROS_PER_SECOND * SECONDS_PER_MINUTE;
pub const MICROS_PER_HOUR: u64 = MICROS_PER_MINUTE * MINUTES_PER_HOUR;
pub const MICROS_PER_DAY: u64 = MICROS_PER_HOUR * HOURS_PER_DAY;

/// Days in one 400-year Gregorian cycle
pub const DAYS_PER_CYCLE: u64 = 146_097;
/// Years in one Gregorian cycle
pub const YEARS_PER_CYCLE: u64 = 400;

/// Day number of 1970-01-01 counted from 0000-03-01
pub(crate) const UNIX_EPOCH_SHIFT: i64 = 719_468;

/// Unix day of -10000-01-01
pub const MIN_UNIX_DAYS: i64 = days_from_civil(MIN_YEAR, JANUARY, MIN_DAY);
/// Unix day of 22767-12-31
pub const MAX_UNIX_DAYS: i64 = days_from_civil(MAX_YEAR, DECEMBER, 31);

/// Largest day count of an exact duration: 918 cycles, 367,200 years
pub const MAX_EXACT_DAYS: u64 = 134_117_046;
/// Largest year count of a calendar duration
pub const MAX_DURATION_YEARS: u64 = 367_200;
/// A month is divided into this many fractions (one hour of a 30-day month)
pub const MONTH_FRACTIONS: u64 = 720;
/// Month fractions in one year
pub const YEAR_FRACTIONS: u64 = MONTH_FRACTIONS * MONTHS_PER_YEAR;

/// Hours shown by a clock-like duration are capped here
pub const TIME_LIKE_MAX_HOURS: u64 = 500;

/// Date component separator (ISO 8601 format)
pub const DATE_SEPARATOR: char = '-';
/// Alternate date separators accepted by lenient parsing
pub const ALT_DATE_SEPARATORS: [char; 2] = ['/', '.'];
/// Time component separator
pub const TIME_SEPARATOR: char = ':';
/// Separates seconds from their fraction
pub const FRACTION_SEPARATOR: char = '.';
/// Joins a date and a time
pub const DATE_TIME_SEPARATOR: char = 'T';
/// Marks a UTC date-time
pub const UTC_DESIGNATOR: char = 'Z';
/// Literal resolved against the clock by every value parser
pub const NOW: &str = "now";
