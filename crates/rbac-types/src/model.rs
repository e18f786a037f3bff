//! Users, roles, permissions, audit entries and their patch types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role id written into users whose role was removed under [`crate::RoleDeletePolicy::Cascade`].
pub const UNASSIGNED_ROLE_ID: &str = "";

/// One capability token from the closed set {read, write, delete, admin}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Delete,
    Admin,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Read,
        Permission::Write,
        Permission::Delete,
        Permission::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Delete => "delete",
            Permission::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct ParsePermissionError(pub String);

impl std::str::FromStr for Permission {
    type Err = ParsePermissionError;

    /// Case-insensitive; anything outside the closed set is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "delete" => Ok(Permission::Delete),
            "admin" => Ok(Permission::Admin),
            _ => Err(ParsePermissionError(s.to_string())),
        }
    }
}

/// Named bundle of permissions assignable to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Set semantics: repeated permissions in the input collapse.
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

impl Role {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Overwrite the fields present in `patch`; the id never changes.
    pub fn apply(&mut self, patch: &RolePatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(ref permissions) = patch.permissions {
            self.permissions = permissions.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

/// An account record referencing exactly one role by id.
///
/// `role_id` is not guaranteed to resolve: roles can be deleted while still referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_id: String,
    #[serde(default)]
    pub status: UserStatus,
    /// Opaque URI, never validated.
    #[serde(default)]
    pub avatar: String,
}

impl User {
    /// Overwrite the fields present in `patch`; the id never changes.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(ref email) = patch.email {
            self.email = email.clone();
        }
        if let Some(ref role_id) = patch.role_id {
            self.role_id = role_id.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(ref avatar) = patch.avatar {
            self.avatar = avatar.clone();
        }
    }
}

/// User record without an id; the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role_id: String,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub avatar: String,
}

impl NewUser {
    pub fn with_id(self, id: String) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            role_id: self.role_id,
            status: self.status,
            avatar: self.avatar,
        }
    }
}

/// Role record without an id; the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

impl NewRole {
    pub fn with_id(self, id: String) -> Role {
        Role {
            id,
            name: self.name,
            description: self.description,
            permissions: self.permissions,
        }
    }
}

/// Partial update for a user. Absent fields are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Partial update for a role. Absent fields are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<Permission>>,
}

/// Immutable, timestamped record of one administrative mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    /// RFC 3339 UTC, assigned by the store.
    pub timestamp: String,
    pub action: String,
    pub details: String,
}
