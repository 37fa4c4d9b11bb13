//! Account roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Role carried in access tokens and checked by the route gate.
///
/// Stored as the `shop.user_role` enum and serialised in upper case
/// (`"USER"`, `"ADMIN"`), matching the token `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular shopper.
    #[default]
    User,
    /// Store operator with access to `/api/admin/**` and banner management.
    Admin,
}

impl Role {
    /// Upper-case wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Authority string derived from the role (`ROLE_USER`, `ROLE_ADMIN`).
    #[must_use]
    pub fn authority(self) -> String {
        format!("ROLE_{}", self.as_str())
    }

    /// Returns `true` for [`Role::Admin`].
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_authority() {
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
        assert_eq!(Role::User.authority(), "ROLE_USER");
    }

    #[test]
    fn test_role_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
