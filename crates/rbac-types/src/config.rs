//! Store configuration: seeding and opt-in validation.

use serde::{Deserialize, Serialize};

/// What `delete_role` does to users that still reference the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleDeletePolicy {
    /// Delete anyway and leave the users pointing at the removed id.
    #[default]
    Preserve,
    /// Refuse with [`crate::AuthzError::RoleInUse`] while any user references the role.
    Restrict,
    /// Delete and move referencing users to [`crate::UNASSIGNED_ROLE_ID`].
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role delete policy: {0} (expected preserve, restrict or cascade)")]
pub struct ParseRoleDeletePolicyError(pub String);

impl std::str::FromStr for RoleDeletePolicy {
    type Err = ParseRoleDeletePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preserve" => Ok(RoleDeletePolicy::Preserve),
            "restrict" => Ok(RoleDeletePolicy::Restrict),
            "cascade" => Ok(RoleDeletePolicy::Cascade),
            _ => Err(ParseRoleDeletePolicyError(s.to_string())),
        }
    }
}

/// Checks layered in front of the mutation primitives. All off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Reject `add_user` / `add_role` when the id is already taken.
    #[serde(default)]
    pub reject_duplicate_ids: bool,
    /// Reject adding a user, or patching its `roleId`, when the role does not exist.
    #[serde(default)]
    pub require_existing_role: bool,
    #[serde(default)]
    pub role_delete: RoleDeletePolicy,
}

impl ValidationPolicy {
    /// Every check on, deletes of referenced roles refused.
    pub fn strict() -> Self {
        Self {
            reject_duplicate_ids: true,
            require_existing_role: true,
            role_delete: RoleDeletePolicy::Restrict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Start from the default roles, users and initialization entry.
    pub seed: bool,
    #[serde(default)]
    pub policy: ValidationPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed: true,
            policy: ValidationPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Reads `RBAC_SEED`, `RBAC_REJECT_DUPLICATE_IDS`, `RBAC_REQUIRE_EXISTING_ROLE` and
    /// `RBAC_ROLE_DELETE_POLICY`. Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let role_delete = std::env::var("RBAC_ROLE_DELETE_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.policy.role_delete);
        Self {
            seed: env_flag("RBAC_SEED").unwrap_or(defaults.seed),
            policy: ValidationPolicy {
                reject_duplicate_ids: env_flag("RBAC_REJECT_DUPLICATE_IDS")
                    .unwrap_or(defaults.policy.reject_duplicate_ids),
                require_existing_role: env_flag("RBAC_REQUIRE_EXISTING_ROLE")
                    .unwrap_or(defaults.policy.require_existing_role),
                role_delete,
            },
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seeded_and_permissive() {
        let cfg = StoreConfig::default();
        assert!(cfg.seed);
        assert!(!cfg.policy.reject_duplicate_ids);
        assert!(!cfg.policy.require_existing_role);
        assert_eq!(cfg.policy.role_delete, RoleDeletePolicy::Preserve);
    }

    #[test]
    fn parses_flags_and_policies() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!("Cascade".parse(), Ok(RoleDeletePolicy::Cascade));
        assert!("drop".parse::<RoleDeletePolicy>().is_err());
    }
}
