//! Domain error types for client commands.
//!
//! Library errors are logged where they are mapped into these variants, so
//! the detail stays in the logs and the terminal only shows
//! [`ClientError::user_message`].

use boxoffice_session::Role;
use std::fmt;

/// Errors from client commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Configuration is missing or invalid.
    Configuration { details: String },
    /// The command needs a signed-in user.
    NotAuthenticated,
    /// The signed-in user lacks a role the command needs.
    AccessDenied { required: Role },
    /// Signing in failed.
    LoginFailed,
    /// Creating the account failed.
    RegistrationFailed,
    /// The service refused the credentials; the session may have ended.
    SessionRejected,
    /// The request was refused before it was sent.
    InvalidRequest { reason: String },
    /// The service could not complete the request.
    RequestFailed { details: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "configuration error: {details}"),
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::AccessDenied { required } => write!(f, "{required} role required"),
            Self::LoginFailed => write!(f, "login failed"),
            Self::RegistrationFailed => write!(f, "registration failed"),
            Self::SessionRejected => write!(f, "service rejected the session credentials"),
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::RequestFailed { details } => write!(f, "request failed: {details}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// Returns a message safe to show in the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { details } => format!("Configuration error: {details}"),
            Self::NotAuthenticated => "Please log in first.".to_string(),
            Self::AccessDenied { required } => format!("Access denied: requires {required}."),
            Self::LoginFailed => "Login failed. Check your email and password.".to_string(),
            Self::RegistrationFailed => "Registration failed. Please try again.".to_string(),
            Self::SessionRejected => "Your session is no longer accepted. Please log in again.".to_string(),
            Self::InvalidRequest { reason } => format!("Cannot do that: {reason}."),
            Self::RequestFailed { .. } => "The booking service could not complete the request.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failure_does_not_say_why() {
        let message = ClientError::LoginFailed.user_message();
        assert!(message.contains("Login failed"));
    }

    #[test]
    fn request_failure_hides_details() {
        let err = ClientError::RequestFailed {
            details: "connection refused at 10.0.0.5".to_string(),
        };
        assert!(err.to_string().contains("10.0.0.5"));
        assert!(!err.user_message().contains("10.0.0.5"));
    }

    #[test]
    fn access_denied_names_role() {
        let err = ClientError::AccessDenied {
            required: Role::Admin,
        };
        assert_eq!(err.user_message(), "Access denied: requires ADMIN.");
    }
}
