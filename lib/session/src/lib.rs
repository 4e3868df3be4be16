//! Client-side session and authorization lifecycle for boxoffice.
//!
//! This crate provides:
//! - A persisted credential slot (`CredentialStore`)
//! - Token decoding without signature verification (`decode_unverified`)
//! - The session state machine (`SessionManager`) with automatic expiry
//! - Role-based view gating (`RouteGuard`, `Route`)
//!
//! # Session Model
//!
//! The booking service issues a signed token on login. The client trusts the
//! token's payload for presentation decisions only; the service checks the
//! signature on every protected request. A session exists while an unexpired
//! token is held, and ends on logout or when the token's expiry passes.
//!
//! # Example
//!
//! ```
//! use boxoffice_session::{GuardDecision, Route, RouteGuard, Session};
//!
//! let guard = RouteGuard::new();
//!
//! // Before the stored token has been read nothing is shown.
//! assert_eq!(guard.check(&Session::uninitialized(), &Route::Home), GuardDecision::Defer);
//!
//! // Anonymous users are sent to the login view.
//! assert_eq!(
//!     guard.check(&Session::anonymous(), &Route::parse("/bookings")),
//!     GuardDecision::Redirect(Route::Login),
//! );
//! ```

pub mod auth;
pub mod claims;
pub mod error;
pub mod guard;
pub mod manager;
pub mod role;
pub mod route;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use auth::{AuthApi, LoginRequest, LoginResponse, RegistrationProfile};
pub use claims::{Claims, decode_unverified};
pub use error::{AuthApiError, CredentialError, SessionError, StoreError};
pub use guard::{GuardDecision, RouteGuard};
pub use manager::SessionManager;
pub use role::{Role, RoleSet};
pub use route::{Access, NavItem, Route, navigation};
pub use session::{Session, SessionEvent, SessionStatus, SessionUser, Token};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
