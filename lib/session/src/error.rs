//! Error types for the session crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `CredentialError`: a stored or issued token cannot be trusted
//! - `StoreError`: the persisted credential slot could not be accessed
//! - `AuthApiError`: the authentication collaborator declined or failed
//! - `SessionError`: the only failures surfaced to callers of the manager
//!
//! Credential and store errors are handled inside the session manager and
//! never reach the view layer. Collaborator errors are logged and then
//! collapsed into a generic `SessionError` so callers cannot tell a wrong
//! password from an unreachable server.

use chrono::{DateTime, Utc};
use std::fmt;

/// Errors from decoding or validating a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The token is not a decodable signed token.
    Malformed { reason: String },
    /// A claim the client relies on is absent.
    MissingClaim { claim: &'static str },
    /// The token decoded but its expiry has passed.
    Expired { expired_at: DateTime<Utc> },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed credential: {reason}"),
            Self::MissingClaim { claim } => {
                write!(f, "credential is missing required claim: {claim}")
            }
            Self::Expired { expired_at } => {
                write!(f, "credential expired at {expired_at}")
            }
        }
    }
}

impl std::error::Error for CredentialError {}

/// Errors from the persisted credential slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading the slot failed.
    ReadFailed { location: String, reason: String },
    /// Writing the slot failed.
    WriteFailed { location: String, reason: String },
    /// Clearing the slot failed.
    ClearFailed { location: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { location, reason } => {
                write!(f, "failed to read credential from {location}: {reason}")
            }
            Self::WriteFailed { location, reason } => {
                write!(f, "failed to write credential to {location}: {reason}")
            }
            Self::ClearFailed { location, reason } => {
                write!(f, "failed to clear credential at {location}: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthApiError {
    /// The service answered with a non-success status.
    Rejected { status: u16 },
    /// The service could not be reached or the exchange broke off.
    Unreachable { details: String },
    /// The service answered successfully but the body was not understood.
    InvalidResponse { details: String },
}

impl fmt::Display for AuthApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status } => write!(f, "request rejected with status {status}"),
            Self::Unreachable { details } => write!(f, "service unreachable: {details}"),
            Self::InvalidResponse { details } => write!(f, "invalid response: {details}"),
        }
    }
}

impl std::error::Error for AuthApiError {}

/// Failures surfaced by the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Signing in did not produce a session.
    LoginFailed,
    /// The account could not be created.
    RegistrationFailed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginFailed => write!(f, "login failed"),
            Self::RegistrationFailed => write!(f, "registration failed"),
        }
    }
}

impl std::error::Error for SessionError {}
