//! Default data every fresh store starts from.

use rbac_types::{Permission, Role, User, UserStatus};

pub const INITIALIZED_DETAILS: &str = "RBAC system initialized with default roles and users";

pub fn roles() -> Vec<Role> {
    vec![
        Role::new("1", "Admin", "Full system access", Permission::ALL),
        Role::new(
            "2",
            "Editor",
            "Can read and modify content",
            [Permission::Read, Permission::Write],
        ),
        Role::new("3", "Viewer", "Read-only access", [Permission::Read]),
    ]
}

pub fn users() -> Vec<User> {
    vec![
        User {
            id: "1".to_string(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            role_id: "1".to_string(),
            status: UserStatus::Active,
            avatar: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=100&h=100&fit=crop"
                .to_string(),
        },
        User {
            id: "2".to_string(),
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            role_id: "2".to_string(),
            status: UserStatus::Active,
            avatar: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=100&h=100&fit=crop"
                .to_string(),
        },
    ]
}
