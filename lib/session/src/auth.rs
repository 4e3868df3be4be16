//! The authentication collaborator seam.
//!
//! The session manager talks to the booking service only through [`AuthApi`],
//! so the state machine can be exercised without a network.

use async_trait::async_trait;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthApiError;
use crate::role::Role;

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

impl LoginRequest {
    /// Creates a login request.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the email used as the login identifier.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `POST /api/auth/register`.
#[derive(Clone, Serialize)]
pub struct RegistrationProfile {
    name: String,
    email: String,
    phone: String,
    password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

impl RegistrationProfile {
    /// Creates a profile without a requested role; the service assigns its
    /// default.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            password: password.into(),
            role: None,
        }
    }

    /// Requests a specific role for the new account.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Returns the account holder's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the email that will identify the account.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the requested role, if any.
    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }
}

impl fmt::Debug for RegistrationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationProfile")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Authentication endpoints of the booking service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, Report<AuthApiError>>;

    /// Creates an account. Does not sign it in.
    async fn register(&self, profile: &RegistrationProfile) -> Result<(), Report<AuthApiError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_wire_format() {
        let json = serde_json::to_value(LoginRequest::new("a@b.com", "pw")).expect("serialize");
        assert_eq!(json, serde_json::json!({"email": "a@b.com", "password": "pw"}));
    }

    #[test]
    fn login_request_debug_hides_password() {
        let debug = format!("{:?}", LoginRequest::new("a@b.com", "hunter2"));
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn registration_omits_absent_role() {
        let profile = RegistrationProfile::new("Ada", "a@b.com", "555-0100", "pw");
        let json = serde_json::to_value(&profile).expect("serialize");
        assert!(json.get("role").is_none());
        assert_eq!(json["phone"], "555-0100");
    }

    #[test]
    fn registration_includes_requested_role() {
        let profile =
            RegistrationProfile::new("Ada", "a@b.com", "555-0100", "pw").with_role(Role::Admin);
        let json = serde_json::to_value(&profile).expect("serialize");
        assert_eq!(json["role"], "ADMIN");
        assert!(!format!("{profile:?}").contains("\"pw\""));
    }

    #[test]
    fn login_response_parses_token() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"token":"a.b.c"}"#).expect("deserialize");
        assert_eq!(response.token, "a.b.c");
    }
}
