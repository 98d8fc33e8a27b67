use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EntityKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub user_id: Option<Uuid>,
    pub details: AuditDetails,
    pub hash: String,
    pub previous_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AuditAction {
    ImportCommitted,
    SystemAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditDetails {
    pub entity_type: String,
    pub created: u32,
    pub updated: u32,
    pub changes: Vec<RecordChange>,
    pub metadata: std::collections::HashMap<String, String>,
}

/// Before/after snapshot of one record touched by an import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordChange {
    pub entity_id: Uuid,
    pub natural_key: String,
    pub change_type: ChangeType,
    pub before: Option<serde_json::Value>,
    pub after: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeType {
    Created,
    Updated,
}

/// Summary handed to the audit collaborator after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportAudit {
    pub actor_id: Uuid,
    pub kind: EntityKind,
    pub created: u32,
    pub updated: u32,
    pub changes: Vec<RecordChange>,
}

impl AuditEntry {
    pub fn for_import(audit: ImportAudit) -> Self {
        // microsecond precision survives a round trip through TIMESTAMPTZ
        let timestamp = Utc::now().trunc_subsecs(6);
        let details = AuditDetails {
            entity_type: audit.kind.to_string(),
            created: audit.created,
            updated: audit.updated,
            changes: audit.changes,
            metadata: std::collections::HashMap::new(),
        };
        let action = AuditAction::ImportCommitted;

        let hash = Self::calculate_hash(&action, &details, &timestamp, None);

        Self {
            id: Uuid::new_v4(),
            timestamp,
            action,
            user_id: Some(audit.actor_id),
            details,
            hash,
            previous_hash: None,
            created_at: timestamp,
        }
    }

    /// Attach this entry after `previous_hash` in the chain and reseal it.
    pub fn link_to(&mut self, previous_hash: Option<String>) {
        self.hash = Self::calculate_hash(
            &self.action,
            &self.details,
            &self.timestamp,
            previous_hash.as_deref(),
        );
        self.previous_hash = previous_hash;
    }

    fn calculate_hash(
        action: &AuditAction,
        details: &AuditDetails,
        timestamp: &DateTime<Utc>,
        previous_hash: Option<&str>,
    ) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_string(action).unwrap_or_default());
        hasher.update(serde_json::to_string(details).unwrap_or_default());
        hasher.update(timestamp.to_rfc3339());
        if let Some(previous) = previous_hash {
            hasher.update(previous);
        }

        hex::encode(hasher.finalize())
    }

    pub fn verify_integrity(&self) -> bool {
        let calculated_hash = Self::calculate_hash(
            &self.action,
            &self.details,
            &self.timestamp,
            self.previous_hash.as_deref(),
        );
        calculated_hash == self.hash
    }
}
