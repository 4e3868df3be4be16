//! Token decoding.
//!
//! Tokens issued by the booking service are compact signed tokens of the form
//! `header.payload.signature`, where the payload is base64url-encoded JSON.
//! The client reads the payload without verifying the signature; the service
//! verifies it on every protected request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rootcause::Report;
use serde::Deserialize;
use std::time::Duration;

use crate::error::CredentialError;
use crate::role::RoleSet;

/// The claims the client relies on, decoded from a token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    subject: String,
    expires_at: DateTime<Utc>,
    roles: RoleSet,
    display_name: Option<String>,
    issued_at: Option<DateTime<Utc>>,
}

impl Claims {
    /// Creates claims with no display name or issue time.
    #[must_use]
    pub fn new(subject: String, expires_at: DateTime<Utc>, roles: RoleSet) -> Self {
        Self {
            subject,
            expires_at,
            roles,
            display_name: None,
            issued_at: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Returns the subject (the account's email on this service).
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the absolute expiry.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the roles carried by the token.
    #[must_use]
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Returns the display name, if the token carries one.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the issue time, if the token carries one.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    /// Returns true if the token is no longer valid at `now`.
    ///
    /// A token expiring exactly at `now` counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Checks that the token is still valid at `now`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Expired` if [`is_expired_at`](Self::is_expired_at)
    /// holds.
    pub fn ensure_unexpired(&self, now: DateTime<Utc>) -> Result<(), Report<CredentialError>> {
        if self.is_expired_at(now) {
            return Err(CredentialError::Expired {
                expired_at: self.expires_at,
            }
            .into());
        }
        Ok(())
    }

    /// Returns how long the token stays valid after `now`, or zero.
    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    exp: Option<f64>,
    #[serde(default)]
    roles: Option<RawRoles>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    iat: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRoles {
    Delimited(String),
    List(Vec<String>),
}

impl RawRoles {
    fn into_role_set(self) -> RoleSet {
        match self {
            Self::Delimited(claim) => RoleSet::from_claim(&claim),
            Self::List(names) => RoleSet::from_names(names),
        }
    }
}

fn timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

fn malformed(reason: impl Into<String>) -> Report<CredentialError> {
    CredentialError::Malformed {
        reason: reason.into(),
    }
    .into()
}

/// Decodes a token's claims without verifying its signature.
///
/// Expiry is not checked here; see [`Claims::is_expired_at`].
///
/// # Errors
///
/// Returns `CredentialError::Malformed` if the token is not three
/// dot-separated segments, the payload is not base64url JSON, or a claim has
/// the wrong type. Returns `CredentialError::MissingClaim` if `sub` or `exp`
/// is absent.
pub fn decode_unverified(token: &str) -> Result<Claims, Report<CredentialError>> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };
    if payload.is_empty() {
        return Err(malformed("empty payload"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| malformed(format!("payload is not base64url: {e}")))?;
    let raw: RawClaims = serde_json::from_slice(&bytes)
        .map_err(|e| malformed(format!("payload is not a claims object: {e}")))?;

    let subject = raw
        .sub
        .filter(|sub| !sub.trim().is_empty())
        .ok_or(CredentialError::MissingClaim { claim: "sub" })?;
    let exp = raw.exp.ok_or(CredentialError::MissingClaim { claim: "exp" })?;
    let expires_at = timestamp(exp).ok_or_else(|| malformed("exp is out of range"))?;

    Ok(Claims {
        subject,
        expires_at,
        roles: raw
            .roles
            .map(RawRoles::into_role_set)
            .unwrap_or_default(),
        display_name: raw.name.filter(|name| !name.trim().is_empty()),
        issued_at: raw.iat.and_then(timestamp),
    })
}

/// Builds unsigned tokens for tests.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::{DateTime, Utc};

    /// Encodes an arbitrary JSON payload as an unsigned token.
    #[must_use]
    pub fn unsigned_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    /// Encodes a token for `subject` expiring at `expires_at`.
    ///
    /// `roles` is the delimited claim; `None` omits the claim.
    #[must_use]
    pub fn token_for(subject: &str, expires_at: DateTime<Utc>, roles: Option<&str>) -> String {
        let mut payload = serde_json::json!({
            "sub": subject,
            "exp": expires_at.timestamp(),
        });
        if let Some(roles) = roles {
            payload["roles"] = serde_json::Value::String(roles.to_string());
        }
        unsigned_token(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{token_for, unsigned_token};
    use super::*;
    use crate::role::Role;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn decodes_subject_expiry_and_roles() {
        let token = token_for("a@b.com", at(1_900_000_000), Some("ADMIN,USER"));
        let claims = decode_unverified(&token).expect("should decode");

        assert_eq!(claims.subject(), "a@b.com");
        assert_eq!(claims.expires_at(), at(1_900_000_000));
        assert_eq!(
            claims.roles(),
            &[Role::Admin, Role::User].into_iter().collect()
        );
        assert!(claims.display_name().is_none());
    }

    #[test]
    fn absent_roles_claim_is_empty_set() {
        let token = token_for("a@b.com", at(1_900_000_000), None);
        let claims = decode_unverified(&token).expect("should decode");
        assert!(claims.roles().is_empty());
    }

    #[test]
    fn roles_as_json_array() {
        let token = unsigned_token(&json!({
            "sub": "a@b.com",
            "exp": 1_900_000_000,
            "roles": ["USER", " ", "ADMIN"],
        }));
        let claims = decode_unverified(&token).expect("should decode");
        assert_eq!(claims.roles(), &RoleSet::admin());
    }

    #[test]
    fn optional_name_and_issued_at() {
        let token = unsigned_token(&json!({
            "sub": "a@b.com",
            "exp": 1_900_000_000,
            "iat": 1_899_990_000,
            "name": "Ada",
        }));
        let claims = decode_unverified(&token).expect("should decode");
        assert_eq!(claims.display_name(), Some("Ada"));
        assert_eq!(claims.issued_at(), Some(at(1_899_990_000)));
    }

    #[test]
    fn fractional_expiry_is_accepted() {
        let token = unsigned_token(&json!({"sub": "a@b.com", "exp": 1_900_000_000.5}));
        let claims = decode_unverified(&token).expect("should decode");
        assert_eq!(claims.expires_at().timestamp_millis(), 1_900_000_000_500);
    }

    #[test]
    fn padded_payload_is_accepted() {
        let token = token_for("a@b.com", at(1_900_000_000), None);
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[1].push_str("==");
        assert!(decode_unverified(&parts.join(".")).is_ok());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in [
            "",
            "not-a-token",
            "a.b",
            "a.b.c.d",
            "header..sig",
            "header.!!!.sig",
            "header.bm90IGpzb24.sig",
        ] {
            assert!(
                decode_unverified(token).is_err(),
                "expected {token:?} to be rejected"
            );
        }
    }

    #[test]
    fn missing_subject_is_rejected() {
        let token = unsigned_token(&json!({"exp": 1_900_000_000}));
        let err = decode_unverified(&token).unwrap_err();
        assert!(err.to_string().contains("sub"));
    }

    #[test]
    fn missing_expiry_is_rejected() {
        let token = unsigned_token(&json!({"sub": "a@b.com"}));
        let err = decode_unverified(&token).unwrap_err();
        assert!(err.to_string().contains("exp"));
    }

    #[test]
    fn wrongly_typed_claim_is_rejected() {
        let token = unsigned_token(&json!({"sub": "a@b.com", "exp": "tomorrow"}));
        assert!(decode_unverified(&token).is_err());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let claims = Claims::new("a@b.com".to_string(), at(100), RoleSet::user());
        assert!(!claims.is_expired_at(at(99)));
        assert!(claims.is_expired_at(at(100)));
        assert!(claims.is_expired_at(at(101)));
    }

    #[test]
    fn expired_claims_report_when_they_expired() {
        let claims = Claims::new("a@b.com".to_string(), at(100), RoleSet::user());
        assert!(claims.ensure_unexpired(at(99)).is_ok());

        let err = claims.ensure_unexpired(at(100)).unwrap_err();
        let expected = CredentialError::Expired { expired_at: at(100) }.to_string();
        assert!(err.to_string().contains(&expected));
    }

    #[test]
    fn time_remaining_saturates_at_zero() {
        let claims = Claims::new("a@b.com".to_string(), at(100), RoleSet::user());
        assert_eq!(claims.time_remaining(at(90)), Duration::from_secs(10));
        assert_eq!(claims.time_remaining(at(200)), Duration::ZERO);
    }
}
