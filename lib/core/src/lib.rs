//! Core types shared by the boxoffice crates.
//!
//! The booking service assigns numeric ids to events, shows and bookings;
//! this crate wraps each in its own type so they cannot be mixed up. It also
//! provides the [`Result`] alias used for error reporting.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{BookingId, EventId, ParseIdError, ShowId};
