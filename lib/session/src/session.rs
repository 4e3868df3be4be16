//! Session state derived from the current token.
//!
//! A `Session` is never persisted. It is recomputed by the session manager
//! whenever the token changes and published to consumers as a snapshot.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::claims::Claims;
use crate::role::{Role, RoleSet};

/// A bearer token as issued by the booking service.
///
/// The `Debug` output is redacted so tokens do not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the value for an `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// The signed-in account as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    subject: String,
    display_name: Option<String>,
    roles: RoleSet,
}

impl SessionUser {
    /// Creates a user with no display name.
    #[must_use]
    pub fn new(subject: String, roles: RoleSet) -> Self {
        Self {
            subject,
            display_name: None,
            roles,
        }
    }

    /// Derives the user from decoded claims.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.subject().to_string(),
            display_name: claims.display_name().map(str::to_string),
            roles: claims.roles().clone(),
        }
    }

    /// Returns the subject claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the display name claim, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the name to greet the user with: display name, else subject.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.subject)
    }

    /// Returns the roles carried by the token.
    #[must_use]
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Returns true if the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if the user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }
}

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The persisted token has not been examined yet.
    Uninitialized,
    /// A token is being decoded or a login is outstanding.
    Loading,
    /// A valid, unexpired token is held.
    Authenticated,
    /// No usable token is held.
    Anonymous,
}

/// The client's current belief about who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: Option<SessionUser>,
    token: Option<Token>,
    expires_at: Option<DateTime<Utc>>,
    status: SessionStatus,
    pending_logins: u32,
    pending_registrations: u32,
}

impl Session {
    /// The state before the persisted token has been read.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            user: None,
            token: None,
            expires_at: None,
            status: SessionStatus::Uninitialized,
            pending_logins: 0,
            pending_registrations: 0,
        }
    }

    /// A settled session with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            ..Self::uninitialized()
        }
    }

    /// Returns the signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Returns the current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Returns when the current token expires, if any.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns true if a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Returns true while the session has not settled.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Uninitialized | SessionStatus::Loading
        )
    }

    /// Returns true while a login or registration call is outstanding.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.pending_logins > 0 || self.pending_registrations > 0
    }

    /// Returns true if the signed-in user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.user.as_ref().is_some_and(|user| user.has_role(role))
    }

    fn settle(&mut self) {
        if self.pending_logins > 0 {
            self.status = SessionStatus::Loading;
        } else if self.user.is_some() {
            self.status = SessionStatus::Authenticated;
        } else {
            self.status = SessionStatus::Anonymous;
        }
    }

    pub(crate) fn mark_loading(&mut self) {
        self.status = SessionStatus::Loading;
    }

    /// Records the start of a login call; the session loads until it ends.
    pub(crate) fn begin_login(&mut self) {
        self.pending_logins += 1;
        self.settle();
    }

    pub(crate) fn finish_login(&mut self) {
        self.pending_logins = self.pending_logins.saturating_sub(1);
        self.settle();
    }

    /// Records the start of a registration call; only the submitting flag
    /// changes.
    pub(crate) fn begin_registration(&mut self) {
        self.pending_registrations += 1;
    }

    pub(crate) fn finish_registration(&mut self) {
        self.pending_registrations = self.pending_registrations.saturating_sub(1);
    }

    pub(crate) fn sign_in(&mut self, token: Token, claims: &Claims) {
        self.user = Some(SessionUser::from_claims(claims));
        self.token = Some(token);
        self.expires_at = Some(claims.expires_at());
        self.settle();
    }

    /// Drops the user and token, returning the user that was signed in.
    pub(crate) fn sign_out(&mut self) -> Option<SessionUser> {
        self.token = None;
        self.expires_at = None;
        let previous = self.user.take();
        self.settle();
        previous
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::uninitialized()
    }
}

/// Transitions announced to the top-level shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login completed.
    LoggedIn { subject: String },
    /// The user logged out.
    LoggedOut,
    /// The token expired; the shell should return to the login entry point.
    Expired { subject: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(roles: RoleSet) -> Claims {
        Claims::new(
            "a@b.com".to_string(),
            Utc::now() + Duration::hours(1),
            roles,
        )
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = Token::new("secret.token.value");
        assert_eq!(format!("{token:?}"), "Token(<redacted>)");
        assert_eq!(token.authorization_header(), "Bearer secret.token.value");
    }

    #[test]
    fn new_session_is_loading_and_anonymous() {
        let session = Session::uninitialized();
        assert!(session.is_loading());
        assert!(!session.is_authenticated());
        assert!(!session.is_submitting());
        assert_eq!(session.status(), SessionStatus::Uninitialized);
    }

    #[test]
    fn sign_in_sets_user_token_and_expiry() {
        let mut session = Session::anonymous();
        let claims = claims(RoleSet::admin());
        session.sign_in(Token::new("t"), &claims);

        assert!(session.is_authenticated());
        assert_eq!(session.user(), Some(&SessionUser::from_claims(&claims)));
        assert_eq!(session.token().map(Token::as_str), Some("t"));
        assert_eq!(session.expires_at(), Some(claims.expires_at()));
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert!(session.has_role(&Role::Admin));
    }

    #[test]
    fn sign_out_returns_previous_user() {
        let mut session = Session::anonymous();
        session.sign_in(Token::new("t"), &claims(RoleSet::user()));

        let previous = session.sign_out();
        assert_eq!(previous.map(|u| u.subject().to_string()), Some("a@b.com".to_string()));
        assert!(session.token().is_none());
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(session.sign_out().is_none());
    }

    #[test]
    fn login_call_keeps_loading_until_finished() {
        let mut session = Session::anonymous();
        session.begin_login();
        assert!(session.is_loading());
        assert!(session.is_submitting());

        session.sign_in(Token::new("t"), &claims(RoleSet::user()));
        assert!(session.is_loading());

        session.finish_login();
        assert!(!session.is_loading());
        assert!(!session.is_submitting());
        assert_eq!(session.status(), SessionStatus::Authenticated);
    }

    #[test]
    fn failed_login_call_restores_prior_status() {
        let mut session = Session::anonymous();
        session.sign_in(Token::new("t"), &claims(RoleSet::user()));
        session.begin_login();
        session.finish_login();
        assert_eq!(session.status(), SessionStatus::Authenticated);
    }

    #[test]
    fn registration_call_does_not_load() {
        let mut session = Session::anonymous();
        session.begin_registration();
        assert!(!session.is_loading());
        assert!(session.is_submitting());
        session.finish_registration();
        assert!(!session.is_submitting());
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn login_finishing_during_registration_settles() {
        let mut session = Session::anonymous();
        session.begin_registration();
        session.begin_login();
        session.finish_login();
        assert!(!session.is_loading());
        assert!(session.is_submitting());
        session.finish_registration();
        assert!(!session.is_submitting());
    }

    #[test]
    fn greeting_prefers_display_name() {
        let plain = SessionUser::new("a@b.com".to_string(), RoleSet::user());
        assert_eq!(plain.greeting_name(), "a@b.com");

        let named = SessionUser::from_claims(&claims(RoleSet::user()).with_display_name("Ada"));
        assert_eq!(named.greeting_name(), "Ada");
    }
}
