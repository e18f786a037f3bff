//! Shared store: one async lock around the whole authorization state.

use crate::AuthzState;
use rbac_types::{
    AuditListOptions, AuditLogEntry, AuthzError, AuthzStore, Mutation, NewRole, NewUser,
    Permission, Role, RolePatch, StoreConfig, User, UserPatch,
};
use std::collections::BTreeSet;
use tokio::sync::RwLock;

/// In-memory implementation of AuthzStore (process lifetime only).
///
/// Users, roles and the audit log sit behind a single lock, so a mutation and its audit
/// entry are always observed together.
pub struct InMemoryAuthzStore {
    state: RwLock<AuthzState>,
}

impl InMemoryAuthzStore {
    /// Seeded store with permissive validation.
    pub fn new() -> Self {
        Self::with_state(AuthzState::seeded())
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::with_state(AuthzState::from_config(config))
    }

    pub fn with_state(state: AuthzState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the full state, for consumers that need a consistent multi-collection view.
    pub async fn snapshot(&self) -> AuthzState {
        self.state.read().await.clone()
    }
}

impl Default for InMemoryAuthzStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuthzStore for InMemoryAuthzStore {
    async fn add_user(&self, user: User) -> Result<Mutation<User>, AuthzError> {
        self.state.write().await.add_user(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<Mutation<User>, AuthzError> {
        self.state.write().await.create_user(user)
    }

    async fn update_user(
        &self,
        id: &str,
        patch: UserPatch,
    ) -> Result<Mutation<User>, AuthzError> {
        self.state.write().await.update_user(id, patch)
    }

    async fn delete_user(&self, id: &str) -> Result<Mutation<User>, AuthzError> {
        self.state.write().await.delete_user(id)
    }

    async fn add_role(&self, role: Role) -> Result<Mutation<Role>, AuthzError> {
        self.state.write().await.add_role(role)
    }

    async fn create_role(&self, role: NewRole) -> Result<Mutation<Role>, AuthzError> {
        self.state.write().await.create_role(role)
    }

    async fn update_role(
        &self,
        id: &str,
        patch: RolePatch,
    ) -> Result<Mutation<Role>, AuthzError> {
        self.state.write().await.update_role(id, patch)
    }

    async fn delete_role(&self, id: &str) -> Result<Mutation<Role>, AuthzError> {
        self.state.write().await.delete_role(id)
    }

    async fn users(&self) -> Vec<User> {
        self.state.read().await.users().to_vec()
    }

    async fn roles(&self) -> Vec<Role> {
        self.state.read().await.roles().to_vec()
    }

    async fn audit_log(&self) -> Vec<AuditLogEntry> {
        self.state.read().await.audit_log().cloned().collect()
    }

    async fn list_audit(&self, opts: &AuditListOptions) -> Vec<AuditLogEntry> {
        self.state.read().await.list_audit(opts)
    }

    async fn user(&self, id: &str) -> Option<User> {
        self.state.read().await.user(id).cloned()
    }

    async fn role(&self, id: &str) -> Option<Role> {
        self.state.read().await.role(id).cloned()
    }

    async fn permissions_for(&self, user_id: &str) -> Option<BTreeSet<Permission>> {
        self.state.read().await.permissions_for(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbac_types::{actions, UserStatus};
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_mutations_each_log_once() {
        let store = Arc::new(InMemoryAuthzStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .add_user(User {
                        id: format!("u{}", i),
                        name: format!("User {}", i),
                        email: format!("u{}@example.com", i),
                        role_id: "3".to_string(),
                        status: UserStatus::Active,
                        avatar: String::new(),
                    })
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.users().await.len(), 18);
        let log = store.audit_log().await;
        assert_eq!(log.len(), 17);
        assert_eq!(
            log.iter()
                .filter(|e| e.action == actions::USER_CREATED)
                .count(),
            16
        );
    }

    #[tokio::test]
    async fn snapshot_matches_queries() {
        let store = InMemoryAuthzStore::new();
        store.delete_role("3").await.unwrap();
        let snap = store.snapshot().await;
        assert_eq!(snap.roles(), store.roles().await.as_slice());
        assert_eq!(snap.audit_len(), store.audit_log().await.len());
    }

    #[tokio::test]
    async fn permission_check_through_trait() {
        let store: Arc<dyn AuthzStore> = Arc::new(InMemoryAuthzStore::new());
        assert!(store.has_permissions("1", &[Permission::Admin]).await);
        assert!(!store.has_permissions("2", &[Permission::Delete]).await);
        store.delete_role("2").await.unwrap();
        assert!(!store.has_permissions("2", &[Permission::Read]).await);
        assert_eq!(store.permissions_for("2").await, None);
    }
}
