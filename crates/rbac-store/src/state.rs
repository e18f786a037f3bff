//! Single-owner authorization state: users, roles and the audit log.

use crate::seed;
use chrono::{SecondsFormat, Utc};
use rbac_types::{
    actions, AuditListOptions, AuditLogEntry, AuthzError, Mutation, NewRole, NewUser, Permission,
    Role, RoleDeletePolicy, RolePatch, StoreConfig, User, UserPatch, ValidationPolicy,
    UNASSIGNED_ROLE_ID,
};
use std::collections::{BTreeSet, VecDeque};
use uuid::Uuid;

/// Shown in "User Created" details when the role id does not resolve.
const UNKNOWN_ROLE_NAME: &str = "unknown";

/// Users, roles and the audit log, mutated only through `&mut self`.
///
/// Each mutation changes the collections and prepends its audit entry before returning,
/// so the entry always describes the state as it is right after the call.
/// The audit log has no retention policy and grows for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct AuthzState {
    users: Vec<User>,
    roles: Vec<Role>,
    /// Newest first.
    audit_log: VecDeque<AuditLogEntry>,
    policy: ValidationPolicy,
}

impl AuthzState {
    /// Empty state: no users, roles or audit entries.
    pub fn new(policy: ValidationPolicy) -> Self {
        Self {
            users: Vec::new(),
            roles: Vec::new(),
            audit_log: VecDeque::new(),
            policy,
        }
    }

    /// Default roles and users plus the initialization entry, with permissive validation.
    pub fn seeded() -> Self {
        Self::from_config(&StoreConfig::default())
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let mut state = Self::new(config.policy);
        if config.seed {
            state.roles = seed::roles();
            state.users = seed::users();
            state.add_audit_entry(actions::SYSTEM_INITIALIZED, seed::INITIALIZED_DETAILS);
        }
        state
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    fn now_iso() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Fresh identifier; never repeats within the process.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Prepend one entry with a generated id and the current time.
    pub fn add_audit_entry(
        &mut self,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> AuditLogEntry {
        let entry = AuditLogEntry {
            id: Self::generate_id(),
            timestamp: Self::now_iso(),
            action: action.into(),
            details: details.into(),
        };
        self.audit_log.push_front(entry.clone());
        entry
    }

    fn check_role_exists(&self, role_id: &str) -> Result<(), AuthzError> {
        if self.policy.require_existing_role && self.role(role_id).is_none() {
            tracing::warn!(role_id = %role_id, "rejected: role does not exist");
            return Err(AuthzError::UnknownRole(role_id.to_string()));
        }
        Ok(())
    }

    pub fn add_user(&mut self, user: User) -> Result<Mutation<User>, AuthzError> {
        if self.policy.reject_duplicate_ids && self.user(&user.id).is_some() {
            tracing::warn!(user_id = %user.id, "rejected: duplicate user id");
            return Err(AuthzError::DuplicateId {
                entity: "user",
                id: user.id,
            });
        }
        self.check_role_exists(&user.role_id)?;
        let role_name = match self.role(&user.role_id) {
            Some(role) => role.name.clone(),
            None => {
                tracing::warn!(user_id = %user.id, role_id = %user.role_id, "user added with unresolved role");
                UNKNOWN_ROLE_NAME.to_string()
            }
        };
        let details = format!("New user {} added with role {}", user.name, role_name);
        self.users.push(user.clone());
        let audit = self.add_audit_entry(actions::USER_CREATED, details);
        tracing::debug!(user_id = %user.id, action = actions::USER_CREATED, "user added");
        Ok(Mutation::applied(user, audit))
    }

    pub fn create_user(&mut self, user: NewUser) -> Result<Mutation<User>, AuthzError> {
        self.add_user(user.with_id(Self::generate_id()))
    }

    pub fn update_user(
        &mut self,
        id: &str,
        patch: UserPatch,
    ) -> Result<Mutation<User>, AuthzError> {
        if let Some(ref role_id) = patch.role_id {
            self.check_role_exists(role_id)?;
        }
        let label = display_label(patch.name.as_deref(), id);
        let mut updated = None;
        for user in self.users.iter_mut().filter(|u| u.id == id) {
            user.apply(&patch);
            updated.get_or_insert_with(|| user.clone());
        }
        let audit = self.add_audit_entry(actions::USER_UPDATED, format!("User {} modified", label));
        tracing::debug!(user_id = %id, found = updated.is_some(), action = actions::USER_UPDATED, "user update");
        Ok(match updated {
            Some(user) => Mutation::applied(user, audit),
            None => Mutation::not_found(id, audit),
        })
    }

    pub fn delete_user(&mut self, id: &str) -> Result<Mutation<User>, AuthzError> {
        let removed = take_matching(&mut self.users, |u| u.id == id)
            .into_iter()
            .next();
        let label = display_label(removed.as_ref().map(|u| u.name.as_str()), id);
        let details = format!("User {} removed from system", label);
        let audit = self.add_audit_entry(actions::USER_DELETED, details);
        tracing::debug!(user_id = %id, found = removed.is_some(), action = actions::USER_DELETED, "user delete");
        Ok(match removed {
            Some(user) => Mutation::applied(user, audit),
            None => Mutation::not_found(id, audit),
        })
    }

    pub fn add_role(&mut self, role: Role) -> Result<Mutation<Role>, AuthzError> {
        if self.policy.reject_duplicate_ids && self.role(&role.id).is_some() {
            tracing::warn!(role_id = %role.id, "rejected: duplicate role id");
            return Err(AuthzError::DuplicateId {
                entity: "role",
                id: role.id,
            });
        }
        let details = format!(
            "New role {} added with {} permissions",
            role.name,
            role.permissions.len()
        );
        self.roles.push(role.clone());
        let audit = self.add_audit_entry(actions::ROLE_CREATED, details);
        tracing::debug!(role_id = %role.id, action = actions::ROLE_CREATED, "role added");
        Ok(Mutation::applied(role, audit))
    }

    pub fn create_role(&mut self, role: NewRole) -> Result<Mutation<Role>, AuthzError> {
        self.add_role(role.with_id(Self::generate_id()))
    }

    pub fn update_role(
        &mut self,
        id: &str,
        patch: RolePatch,
    ) -> Result<Mutation<Role>, AuthzError> {
        let label = display_label(patch.name.as_deref(), id);
        let mut updated = None;
        for role in self.roles.iter_mut().filter(|r| r.id == id) {
            role.apply(&patch);
            updated.get_or_insert_with(|| role.clone());
        }
        let audit = self.add_audit_entry(actions::ROLE_UPDATED, format!("Role {} modified", label));
        tracing::debug!(role_id = %id, found = updated.is_some(), action = actions::ROLE_UPDATED, "role update");
        Ok(match updated {
            Some(role) => Mutation::applied(role, audit),
            None => Mutation::not_found(id, audit),
        })
    }

    /// Remove every role with this id. Users referencing it are handled per [`RoleDeletePolicy`].
    pub fn delete_role(&mut self, id: &str) -> Result<Mutation<Role>, AuthzError> {
        let referencing = self.users.iter().filter(|u| u.role_id == id).count();
        if referencing > 0
            && self.policy.role_delete == RoleDeletePolicy::Restrict
            && self.role(id).is_some()
        {
            tracing::warn!(role_id = %id, users = referencing, "rejected: role still assigned");
            return Err(AuthzError::RoleInUse {
                id: id.to_string(),
                users: referencing,
            });
        }

        let removed = take_matching(&mut self.roles, |r| r.id == id);
        let Some(role) = removed.into_iter().next() else {
            let audit = self.add_audit_entry(
                actions::ROLE_DELETED,
                format!("Role {} removed from system", id),
            );
            tracing::debug!(role_id = %id, found = false, action = actions::ROLE_DELETED, "role delete");
            return Ok(Mutation::not_found(id, audit));
        };

        let mut details = format!(
            "Role {} removed from system",
            display_label(Some(role.name.as_str()), id)
        );
        match self.policy.role_delete {
            RoleDeletePolicy::Cascade if referencing > 0 => {
                for user in self.users.iter_mut().filter(|u| u.role_id == id) {
                    user.role_id = UNASSIGNED_ROLE_ID.to_string();
                }
                details.push_str(&format!("; {} user(s) unassigned", referencing));
            }
            _ if referencing > 0 => {
                tracing::warn!(role_id = %id, users = referencing, "role deleted while still assigned");
            }
            _ => {}
        }
        let audit = self.add_audit_entry(actions::ROLE_DELETED, details);
        tracing::debug!(role_id = %id, found = true, action = actions::ROLE_DELETED, "role delete");
        Ok(Mutation::applied(role, audit))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Newest first.
    pub fn audit_log(&self) -> impl Iterator<Item = &AuditLogEntry> {
        self.audit_log.iter()
    }

    pub fn audit_len(&self) -> usize {
        self.audit_log.len()
    }

    pub fn list_audit(&self, opts: &AuditListOptions) -> Vec<AuditLogEntry> {
        self.audit_log
            .iter()
            .filter(|e| opts.matches(e))
            .cloned()
            .collect()
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    pub fn users_with_role(&self, role_id: &str) -> Vec<&User> {
        self.users.iter().filter(|u| u.role_id == role_id).collect()
    }

    pub fn permissions_for(&self, user_id: &str) -> Option<&BTreeSet<Permission>> {
        let user = self.user(user_id)?;
        self.role(&user.role_id).map(|r| &r.permissions)
    }

    /// False when the user is missing or its role no longer exists.
    pub fn has_permissions(&self, user_id: &str, required: &[Permission]) -> bool {
        self.permissions_for(user_id)
            .is_some_and(|granted| required.iter().all(|p| granted.contains(p)))
    }
}

impl Default for AuthzState {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Remove every item matching `pred`, keeping the rest in order. Removed items keep their order too.
fn take_matching<T>(items: &mut Vec<T>, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if pred(&item) {
            removed.push(item);
        } else {
            kept.push(item);
        }
    }
    *items = kept;
    removed
}

/// The given name when present and non-empty, otherwise the raw id.
fn display_label<'a>(name: Option<&'a str>, id: &'a str) -> &'a str {
    name.filter(|n| !n.is_empty()).unwrap_or(id)
}
