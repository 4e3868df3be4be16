//! Strongly-typed ID types for the booking service's resources.
//!
//! The remote service assigns numeric identifiers to events, shows and
//! bookings. Each gets its own wrapper so they cannot be mixed up when
//! building request paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed wrapper around a server-assigned id.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw server-assigned id.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw numeric id.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns the prefix accepted when parsing.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        // Displays as the bare number so it can be used in request paths.
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let prefix_with_underscore = concat!($prefix, "_");
                let raw = s.strip_prefix(prefix_with_underscore).unwrap_or(s);

                raw.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of an event (a film, concert or play that has shows).
    EventId,
    "evt"
);

define_id!(
    /// Identifier of a show (one scheduled screening of an event).
    ShowId,
    "show"
);

define_id!(
    /// Identifier of a confirmed booking.
    BookingId,
    "bkg"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_bare_number() {
        assert_eq!(EventId::new(42).to_string(), "42");
        assert_eq!(ShowId::new(7).to_string(), "7");
    }

    #[test]
    fn parse_with_prefix() {
        let id: ShowId = "show_15".parse().expect("should parse");
        assert_eq!(id, ShowId::new(15));
    }

    #[test]
    fn parse_without_prefix() {
        let id: EventId = "3".parse().expect("should parse");
        assert_eq!(id.get(), 3);
    }

    #[test]
    fn parse_invalid_id() {
        let result: Result<BookingId, _> = "abc".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "BookingId");
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let result: Result<EventId, _> = "show_3".parse();
        assert!(result.is_err());
    }

    #[test]
    fn id_serializes_as_number() {
        let json = serde_json::to_string(&EventId::new(9)).expect("serialize");
        assert_eq!(json, "9");
        let parsed: EventId = serde_json::from_str("9").expect("deserialize");
        assert_eq!(parsed, EventId::new(9));
    }
}
