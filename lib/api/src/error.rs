//! Error types for resource requests.

use std::fmt;

/// Errors from the booking service's resource endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The HTTP client could not be built.
    Configuration { details: String },
    /// The service answered with a non-success status.
    Rejected { status: u16 },
    /// The service could not be reached.
    Unreachable { details: String },
    /// The response body was not understood.
    InvalidResponse { details: String },
    /// The request breaks a rule checked before sending.
    InvalidRequest { reason: String },
    /// The event still has scheduled shows.
    EventHasShows { count: usize },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "invalid client configuration: {details}"),
            Self::Rejected { status } => write!(f, "request rejected with status {status}"),
            Self::Unreachable { details } => write!(f, "service unreachable: {details}"),
            Self::InvalidResponse { details } => write!(f, "invalid response: {details}"),
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::EventHasShows { count } => write!(
                f,
                "cannot delete event with existing shows; delete all {count} show(s) first"
            ),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Returns true if the service refused the caller's credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403 })
    }
}
