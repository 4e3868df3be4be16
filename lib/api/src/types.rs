//! Resources exchanged with the booking service.
//!
//! Field names follow the service's camelCase JSON. Times are the service's
//! local wall-clock times and carry no offset.

use boxoffice_core::{BookingId, EventId, Result, ShowId};
use chrono::{Duration, NaiveDateTime};
use rootcause::Report;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

fn invalid(reason: impl Into<String>) -> Report<ApiError> {
    ApiError::InvalidRequest {
        reason: reason.into(),
    }
    .into()
}

/// An event (a film, concert or play) that shows are scheduled for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub rating: Option<String>,
}

/// Body for creating or updating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub city: String,
    pub language: String,
    pub genre: String,
    pub duration_minutes: u32,
    pub rating: String,
}

impl EventDraft {
    /// Checks the draft before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the title is blank or the
    /// duration is not a positive number of minutes.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(invalid("title is required"));
        }
        if self.duration_minutes == 0 {
            return Err(invalid("duration must be a positive number"));
        }
        Ok(())
    }
}

/// One scheduled screening of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: ShowId,
    /// Present when the service embeds the parent event.
    #[serde(default)]
    pub event: Option<Event>,
    pub venue_name: String,
    pub auditorium_name: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_seats: u32,
    #[serde(default)]
    pub booked_seats: u32,
}

impl Show {
    /// Returns the id of the parent event, if embedded.
    #[must_use]
    pub fn event_id(&self) -> Option<EventId> {
        self.event.as_ref().map(|event| event.id)
    }

    /// Returns the number of seats still free.
    #[must_use]
    pub fn seats_available(&self) -> u32 {
        self.total_seats.saturating_sub(self.booked_seats)
    }
}

/// Returns when a show starting at `start` ends for an event of the given
/// length.
#[must_use]
pub fn show_end_time(start: NaiveDateTime, duration_minutes: u32) -> NaiveDateTime {
    start + Duration::minutes(i64::from(duration_minutes))
}

/// Body for scheduling a show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShow {
    pub event_id: EventId,
    pub venue_name: String,
    pub auditorium_name: String,
    pub start_time: NaiveDateTime,
    pub total_seats: u32,
}

impl NewShow {
    /// Checks the show before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if the start time is not after
    /// `now`, the venue or auditorium is blank, or the show has no seats.
    pub fn validate(&self, now: NaiveDateTime) -> Result<(), ApiError> {
        if self.start_time <= now {
            return Err(invalid("start time must be in the future"));
        }
        if self.venue_name.trim().is_empty() || self.auditorium_name.trim().is_empty() {
            return Err(invalid("venue and auditorium are required"));
        }
        if self.total_seats == 0 {
            return Err(invalid("a show needs at least one seat"));
        }
        Ok(())
    }
}

/// Body for reserving seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub show_id: ShowId,
    pub seat_count: u32,
}

impl BookingRequest {
    /// Creates a request for `seat_count` seats.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if `seat_count` is zero.
    pub fn new(show_id: ShowId, seat_count: u32) -> Result<Self, ApiError> {
        if seat_count == 0 {
            return Err(invalid("at least one seat must be booked"));
        }
        Ok(Self {
            show_id,
            seat_count,
        })
    }

    /// Checks the request against the show's free seats.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if more seats are requested than
    /// are available.
    pub fn check_availability(&self, show: &Show) -> Result<(), ApiError> {
        let available = show.seats_available();
        if self.seat_count > available {
            return Err(invalid(format!(
                "only {available} seat(s) available, {} requested",
                self.seat_count
            )));
        }
        Ok(())
    }
}

/// A confirmed reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    #[serde(default)]
    pub show: Option<Show>,
    #[serde(default)]
    pub seat_numbers: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Booking {
    /// Returns the seat label with the service's allocation prefix removed.
    #[must_use]
    pub fn seat_label(&self) -> &str {
        self.seat_numbers
            .as_deref()
            .map_or("0", |seats| seats.strip_prefix("AUTO_").unwrap_or(seats))
    }
}
