//! Store trait and error types.

use crate::{
    AuditListOptions, AuditLogEntry, Mutation, NewRole, NewUser, Permission, Role, RolePatch, User,
    UserPatch,
};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Authorization state store: users, roles and the audit log behind one boundary.
///
/// Every mutation appends exactly one audit entry in the same call and returns it.
/// `Err` is only produced when the configured [`crate::ValidationPolicy`] rejects the call;
/// in that case nothing changes and nothing is logged. Id misses are not errors: they come
/// back as [`crate::MutationOutcome::NotFound`].
#[async_trait]
pub trait AuthzStore: Send + Sync {
    async fn add_user(&self, user: User) -> Result<Mutation<User>, AuthzError>;

    /// Like `add_user`, with a store-generated id.
    async fn create_user(&self, user: NewUser) -> Result<Mutation<User>, AuthzError>;

    async fn update_user(&self, id: &str, patch: UserPatch)
        -> Result<Mutation<User>, AuthzError>;

    async fn delete_user(&self, id: &str) -> Result<Mutation<User>, AuthzError>;

    async fn add_role(&self, role: Role) -> Result<Mutation<Role>, AuthzError>;

    /// Like `add_role`, with a store-generated id.
    async fn create_role(&self, role: NewRole) -> Result<Mutation<Role>, AuthzError>;

    async fn update_role(&self, id: &str, patch: RolePatch)
        -> Result<Mutation<Role>, AuthzError>;

    async fn delete_role(&self, id: &str) -> Result<Mutation<Role>, AuthzError>;

    /// Users in insertion order.
    async fn users(&self) -> Vec<User>;

    /// Roles in insertion order.
    async fn roles(&self) -> Vec<Role>;

    /// Whole audit log, newest first.
    async fn audit_log(&self) -> Vec<AuditLogEntry>;

    async fn list_audit(&self, opts: &AuditListOptions) -> Vec<AuditLogEntry>;

    async fn user(&self, id: &str) -> Option<User>;

    async fn role(&self, id: &str) -> Option<Role>;

    /// Permissions of the user's role; `None` if the user or its role is missing.
    async fn permissions_for(&self, user_id: &str) -> Option<BTreeSet<Permission>>;

    /// True iff the user's role carries every permission in `required`.
    async fn has_permissions(&self, user_id: &str, required: &[Permission]) -> bool {
        match self.permissions_for(user_id).await {
            Some(granted) => required.iter().all(|p| granted.contains(p)),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("{entity} already exists: {id}")]
    DuplicateId { entity: &'static str, id: String },
    #[error("role not found: {0}")]
    UnknownRole(String),
    #[error("role {id} is still assigned to {users} user(s)")]
    RoleInUse { id: String, users: usize },
}
