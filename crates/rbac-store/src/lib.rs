//! Authorization state store: synchronous state container and its shared async wrapper.

mod memory;
pub mod seed;
mod state;

pub use memory::InMemoryAuthzStore;
pub use rbac_types::{
    AuditListOptions, AuditLogEntry, AuthzError, AuthzStore, Mutation, MutationOutcome, Permission,
    Role, RolePatch, StoreConfig, User, UserPatch, ValidationPolicy,
};
pub use state::AuthzState;
