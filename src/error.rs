//! Error type shared by every value, codec and parser in the crate.

use derive_more::Display;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// A constructed or validated value lies outside its documented bound.
    #[display(fmt = "range")]
    Range,
    /// Text does not match any accepted grammar.
    #[display(fmt = "content")]
    Content,
    /// A bit stream ran out before a field could be read or written.
    #[display(fmt = "insufficient data")]
    InsufficientData,
    /// A duration would exceed what its type can represent.
    #[display(fmt = "overflow")]
    Overflow,
}

/// All errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A field value outside its inclusive range.
    #[error("{field} out of range: {value} (must be {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min:   i64,
        max:   i64,
    },

    /// A day that does not exist in its month.
    #[error("invalid day {day} for {year}-{month:02}")]
    InvalidDay { year: i32, month: u8, day: u8 },

    /// Text that no grammar for the field accepts.
    #[error("invalid {field}: {input:?}")]
    Content { field: &'static str, input: String },

    /// Reading past the end of a mounted buffer.
    #[error("insufficient data: needed {needed} bits, {available} remaining")]
    InsufficientData { needed: u32, available: usize },

    /// Writing past the end of a mounted buffer.
    #[error("buffer full: cannot write {needed} bits, {available} remaining")]
    BufferFull { needed: u32, available: usize },

    /// A magnitude above the type's maximum.
    #[error("{what} exceeds the maximum of {max}")]
    AtMost { what: &'static str, max: &'static str },

    /// A magnitude below zero.
    #[error("{what} must not be negative")]
    Negative { what: &'static str },

    /// A calendar unit where only exact units are allowed.
    #[error("{unit} have no exact length")]
    Vague { unit: &'static str },
}

impl Error {
    /// Returns the class this error belongs to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfRange { .. } | Self::InvalidDay { .. } => ErrorKind::Range,
            Self::Content { .. } => ErrorKind::Content,
            Self::InsufficientData { .. } | Self::BufferFull { .. } => ErrorKind::InsufficientData,
            Self::AtMost { .. } | Self::Negative { .. } | Self::Vague { .. } => ErrorKind::Overflow,
        }
    }

    pub(crate) fn out_of_range(field: &'static str, value: impl Into<i64>, min: impl Into<i64>, max: impl Into<i64>) -> Self {
        Self::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub(crate) fn content(field: &'static str, input: &str) -> Self {
        Self::Content {
            field,
            input: input.to_owned(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Error::out_of_range("hour", 24, 0, 23).kind(), ErrorKind::Range);
        assert_eq!(
            Error::InvalidDay {
                year:  2023,
                month: 2,
                day:   29,
            }
            .kind(),
            ErrorKind::Range
        );
        assert_eq!(Error::content("date", "x").kind(), ErrorKind::Content);
        assert_eq!(
            Error::InsufficientData {
                needed:    8,
                available: 3,
            }
            .kind(),
            ErrorKind::InsufficientData
        );
        assert_eq!(Error::Negative { what: "duration" }.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn test_messages() {
        let err = Error::out_of_range("hour", 24, 0, 23);
        assert_eq!(err.to_string(), "hour out of range: 24 (must be 0..=23)");

        let err = Error::InvalidDay {
            year:  2023,
            month: 2,
            day:   29,
        };
        assert_eq!(err.to_string(), "invalid day 29 for 2023-02");

        let err = Error::content("month", "Smarch");
        assert_eq!(err.to_string(), r#"invalid month: "Smarch""#);

        assert_eq!(ErrorKind::InsufficientData.to_string(), "insufficient data");
    }
}
