//! Role types for role-based navigation and access control.
//!
//! Roles arrive inside the credential issued by the booking service as a
//! comma-delimited claim (e.g. `"ADMIN,USER"`). The client only ever reads
//! them; it never adds or upgrades a role on its own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Delimiter used by the `roles` claim.
pub const ROLE_DELIMITER: char = ',';

/// A role granted to the signed-in account.
///
/// The service currently issues two roles:
/// - `User`: may browse events and book seats
/// - `Admin`: may additionally manage events and shows
///
/// Any other role name is preserved verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Standard account.
    User,
    /// Administrator with event/show management capabilities.
    Admin,
    /// A role this client has no special handling for.
    Other(String),
}

impl Role {
    /// Parses a role from its wire name.
    ///
    /// Matching is exact: the service issues upper-case names.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "USER" => Self::User,
            "ADMIN" => Self::Admin,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Other(name) => name,
        }
    }

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Set of roles carried by a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    roles: BTreeSet<Role>,
}

impl RoleSet {
    /// Creates an empty role set.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a role set with user access only.
    #[must_use]
    pub fn user() -> Self {
        [Role::User].into_iter().collect()
    }

    /// Creates a role set with admin and user access.
    #[must_use]
    pub fn admin() -> Self {
        [Role::User, Role::Admin].into_iter().collect()
    }

    /// Parses the delimited form of the `roles` claim.
    ///
    /// Segments are trimmed and empty segments are dropped, so `"ADMIN, ,USER"`
    /// yields `{ADMIN, USER}` and `""` yields the empty set.
    #[must_use]
    pub fn from_claim(claim: &str) -> Self {
        Self::from_names(claim.split(ROLE_DELIMITER))
    }

    /// Builds a role set from individual role names, trimming each and
    /// skipping blanks.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref().trim();
                (!name.is_empty()).then(|| Role::from_name(name))
            })
            .collect()
    }

    /// Returns true if the set contains the given role.
    #[must_use]
    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if the account holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// Returns true if no roles were granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns the number of distinct roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Iterates over the roles in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for role in &self.roles {
            if !first {
                write!(f, "{ROLE_DELIMITER}")?;
            }
            f.write_str(role.as_str())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_admin() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Other("AUDITOR".to_string()).is_admin());
    }

    #[test]
    fn unknown_role_names_are_preserved() {
        let role = Role::from_name("AUDITOR");
        assert_eq!(role, Role::Other("AUDITOR".to_string()));
        assert_eq!(role.as_str(), "AUDITOR");
    }

    #[test]
    fn role_names_are_case_sensitive() {
        assert_eq!(Role::from_name("admin"), Role::Other("admin".to_string()));
    }

    #[test]
    fn claim_with_two_roles() {
        let roles = RoleSet::from_claim("ADMIN,USER");
        assert_eq!(roles, RoleSet::admin());
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn claim_segments_are_trimmed_and_blanks_dropped() {
        let roles = RoleSet::from_claim(" ADMIN , ,USER,");
        assert!(roles.contains(&Role::Admin));
        assert!(roles.contains(&Role::User));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn empty_claim_is_empty_set() {
        assert!(RoleSet::from_claim("").is_empty());
        assert!(RoleSet::from_claim(" , ").is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let roles = RoleSet::from_claim("USER,USER");
        assert_eq!(roles, RoleSet::user());
    }

    #[test]
    fn display_joins_with_delimiter() {
        assert_eq!(RoleSet::admin().to_string(), "USER,ADMIN");
        assert_eq!(RoleSet::none().to_string(), "");
    }

    #[test]
    fn role_serialization_format() {
        let json = serde_json::to_string(&Role::Admin).expect("serialize");
        assert_eq!(json, "\"ADMIN\"");

        let parsed: Role = serde_json::from_str("\"USER\"").expect("deserialize");
        assert_eq!(parsed, Role::User);
    }
}
