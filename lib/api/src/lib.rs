//! HTTP client for the boxoffice booking service.
//!
//! [`ApiClient`] implements the session crate's [`AuthApi`] seam for
//! `/api/auth/*` and exposes the event, show and booking endpoints. Requests
//! carry the session's bearer token when one is supplied; the client never
//! reads or stores tokens itself.
//!
//! [`AuthApi`]: boxoffice_session::AuthApi

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{ApiClient, ensure_event_deletable};
pub use config::{ApiConfig, ApiConfigBuilder};
pub use error::ApiError;
pub use types::{Booking, BookingRequest, Event, EventDraft, NewShow, Show, show_end_time};
