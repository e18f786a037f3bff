//! Command protocol and dispatcher.
//!
//! One JSON object per input line, tagged by `op`; one response envelope per output line.

use rbac_types::{
    AuditListOptions, AuditLogEntry, AuthzError, AuthzStore, Mutation, MutationOutcome, NewRole, NewUser,
    Permission, Role, RolePatch, User, UserPatch,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    ListUsers,
    ListRoles,
    ListAudit {
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        since: Option<String>,
    },
    GetUser {
        id: String,
    },
    GetRole {
        id: String,
    },
    AddUser {
        user: User,
    },
    CreateUser {
        user: NewUser,
    },
    UpdateUser {
        id: String,
        patch: UserPatch,
    },
    DeleteUser {
        id: String,
    },
    AddRole {
        role: Role,
    },
    CreateRole {
        role: NewRole,
    },
    UpdateRole {
        id: String,
        patch: RolePatch,
    },
    DeleteRole {
        id: String,
    },
    /// Permission gate: does the user's role carry every permission in `requires`?
    Check {
        user_id: String,
        #[serde(default)]
        requires: Vec<Permission>,
    },
}

/// Response envelope written for every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleResponse {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ConsoleResponse {
    fn success(data: serde_json::Value) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn from_value<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self::success(v),
            Err(e) => Self::error(500, e.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// `data` payload of a mutation response.
#[derive(Serialize)]
struct MutationData<'a, T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    entity: Option<&'a T>,
    audit: &'a AuditLogEntry,
}

fn mutation_response<T: Serialize>(
    kind: &str,
    result: Result<Mutation<T>, AuthzError>,
) -> ConsoleResponse {
    let mutation = match result {
        Ok(m) => m,
        Err(e) => return ConsoleResponse::error(409, e.to_string()),
    };
    let mut res = ConsoleResponse::from_value(&MutationData {
        entity: mutation.entity(),
        audit: &mutation.audit,
    });
    if let MutationOutcome::NotFound { ref id } = mutation.outcome {
        if res.code == 200 {
            res.code = 404;
            res.message = format!("{} not found: {}", kind, id);
        }
    }
    res
}

/// Run one command against the store.
pub async fn execute(store: &dyn AuthzStore, cmd: Command) -> ConsoleResponse {
    match cmd {
        Command::ListUsers => ConsoleResponse::from_value(&store.users().await),
        Command::ListRoles => ConsoleResponse::from_value(&store.roles().await),
        Command::ListAudit { action, since } => {
            let since = match since.as_deref().map(AuditListOptions::parse_since).transpose() {
                Ok(since) => since,
                Err(e) => return ConsoleResponse::error(400, e.to_string()),
            };
            let opts = AuditListOptions { action, since };
            ConsoleResponse::from_value(&store.list_audit(&opts).await)
        }
        Command::GetUser { id } => match store.user(&id).await {
            Some(user) => ConsoleResponse::from_value(&user),
            None => ConsoleResponse::error(404, format!("user not found: {}", id)),
        },
        Command::GetRole { id } => match store.role(&id).await {
            Some(role) => ConsoleResponse::from_value(&role),
            None => ConsoleResponse::error(404, format!("role not found: {}", id)),
        },
        Command::AddUser { user } => mutation_response("user", store.add_user(user).await),
        Command::CreateUser { user } => mutation_response("user", store.create_user(user).await),
        Command::UpdateUser { id, patch } => {
            mutation_response("user", store.update_user(&id, patch).await)
        }
        Command::DeleteUser { id } => mutation_response("user", store.delete_user(&id).await),
        Command::AddRole { role } => mutation_response("role", store.add_role(role).await),
        Command::CreateRole { role } => mutation_response("role", store.create_role(role).await),
        Command::UpdateRole { id, patch } => {
            mutation_response("role", store.update_role(&id, patch).await)
        }
        Command::DeleteRole { id } => mutation_response("role", store.delete_role(&id).await),
        Command::Check { user_id, requires } => {
            let allowed = store.has_permissions(&user_id, &requires).await;
            ConsoleResponse::success(serde_json::json!({
                "user_id": user_id,
                "requires": requires,
                "allowed": allowed,
            }))
        }
    }
}

pub fn parse_command(line: &str) -> Result<Command, ConsoleError> {
    Ok(serde_json::from_str(line)?)
}

/// Handle one input line. Blank lines yield `None`.
pub async fn handle_line(store: &dyn AuthzStore, line: &str) -> Option<ConsoleResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let res = match parse_command(line) {
        Ok(cmd) => {
            tracing::debug!(command = ?cmd, "executing");
            execute(store, cmd).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected input line");
            ConsoleResponse::error(400, e.to_string())
        }
    };
    Some(res)
}

/// Read commands until EOF, writing one JSON response per command. Returns the number handled.
pub async fn run<R, W>(
    store: &dyn AuthzStore,
    reader: R,
    mut writer: W,
) -> Result<usize, ConsoleError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;
    while let Some(line) = lines.next_line().await? {
        let Some(res) = handle_line(store, &line).await else {
            continue;
        };
        let out = serde_json::to_string(&res)?;
        writer.write_all(format!("{}\n", out).as_bytes()).await?;
        writer.flush().await?;
        handled += 1;
    }
    Ok(handled)
}
