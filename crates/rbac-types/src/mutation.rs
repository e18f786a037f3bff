//! Mutation receipts, audit action labels, and audit query options.

use crate::AuditLogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action labels written by the store.
pub mod actions {
    pub const SYSTEM_INITIALIZED: &str = "System Initialized";
    pub const USER_CREATED: &str = "User Created";
    pub const USER_UPDATED: &str = "User Updated";
    pub const USER_DELETED: &str = "User Deleted";
    pub const ROLE_CREATED: &str = "Role Created";
    pub const ROLE_UPDATED: &str = "Role Updated";
    pub const ROLE_DELETED: &str = "Role Deleted";
}

/// What a mutation did to its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MutationOutcome<T> {
    /// Entity as it exists right after the call (for deletes, the removed entity).
    Applied { entity: T },
    /// Nothing matched the id; state is unchanged but the attempt is still audited.
    NotFound { id: String },
}

/// Result of one mutation together with the audit entry it appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation<T> {
    pub outcome: MutationOutcome<T>,
    pub audit: AuditLogEntry,
}

impl<T> Mutation<T> {
    pub fn applied(entity: T, audit: AuditLogEntry) -> Self {
        Self {
            outcome: MutationOutcome::Applied { entity },
            audit,
        }
    }

    pub fn not_found(id: impl Into<String>, audit: AuditLogEntry) -> Self {
        Self {
            outcome: MutationOutcome::NotFound { id: id.into() },
            audit,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.outcome, MutationOutcome::NotFound { .. })
    }

    pub fn entity(&self) -> Option<&T> {
        match &self.outcome {
            MutationOutcome::Applied { entity } => Some(entity),
            MutationOutcome::NotFound { .. } => None,
        }
    }

    pub fn into_entity(self) -> Option<T> {
        match self.outcome {
            MutationOutcome::Applied { entity } => Some(entity),
            MutationOutcome::NotFound { .. } => None,
        }
    }
}

/// Filters for listing audit entries. Results stay newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditListOptions {
    /// Exact action label, e.g. `"User Deleted"`.
    #[serde(default)]
    pub action: Option<String>,
    /// Return entries stamped at or after this instant.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid since timestamp {value:?}: {source}")]
pub struct InvalidSince {
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

impl AuditListOptions {
    /// Parse an RFC 3339 bound; any offset is accepted and normalized to UTC.
    pub fn parse_since(value: &str) -> Result<DateTime<Utc>, InvalidSince> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|source| InvalidSince {
                value: value.to_string(),
                source,
            })
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(ref action) = self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(since) = self.since {
            match DateTime::parse_from_rfc3339(&entry.timestamp) {
                Ok(ts) if ts.with_timezone(&Utc) >= since => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(timestamp: &str) -> AuditLogEntry {
        AuditLogEntry {
            id: "e1".to_string(),
            timestamp: timestamp.to_string(),
            action: actions::USER_CREATED.to_string(),
            details: String::new(),
        }
    }

    fn since(value: &str) -> AuditListOptions {
        AuditListOptions {
            action: None,
            since: Some(AuditListOptions::parse_since(value).unwrap()),
        }
    }

    #[test]
    fn since_compares_instants_not_text() {
        let e = entry("2026-10-19T20:25:41.147Z");
        assert!(since("2026-10-19T20:25:41Z").matches(&e));
        assert!(since("2026-10-19T20:25:41.147Z").matches(&e));
        assert!(!since("2026-10-19T20:25:41.148Z").matches(&e));
    }

    #[test]
    fn since_honours_offsets() {
        let e = entry("2026-10-19T20:25:41.000Z");
        assert!(since("2026-10-19T22:00:00+02:00").matches(&e));
        assert!(!since("2026-10-19T21:00:00-01:00").matches(&e));
    }

    #[test]
    fn rejects_malformed_since() {
        let err = AuditListOptions::parse_since("yesterday").unwrap_err();
        assert_eq!(err.value, "yesterday");
    }

    #[test]
    fn action_filter_is_exact() {
        let opts = AuditListOptions {
            action: Some(actions::USER_DELETED.to_string()),
            since: None,
        };
        assert!(!opts.matches(&entry("2026-10-19T20:25:41.000Z")));
    }
}
