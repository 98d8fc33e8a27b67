//! Audit Repository
//!
//! Immutable, hash-chained audit trail. Every committed
//! import is appended as one entry linked to its predecessor's hash.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use fieldops_models::{AuditAction, AuditDetails, AuditEntry, ImportAudit};
use fieldops_utils::import::AuditSink;
use fieldops_utils::{FieldOpsError, FieldOpsResult};

/// Serializes appends so two commits never link to the same predecessor.
const CHAIN_LOCK_KEY: i64 = 0x6175_6469_745f_6368;

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry at the end of the chain (immutable - no update/delete)
    pub async fn append(&self, mut entry: AuditEntry) -> Result<AuditEntry> {
        let mut tx = self.pool.begin().await.context("Failed to open audit transaction")?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CHAIN_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .context("Failed to lock audit chain")?;

        let previous: Option<(String,)> = sqlx::query_as(
            "SELECT hash FROM audit_entries ORDER BY timestamp DESC, created_at DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to read audit chain head")?;

        entry.link_to(previous.map(|(hash,)| hash));

        let action = serde_json::to_string(&entry.action)?;
        let details = serde_json::to_value(&entry.details)?;

        let row: AuditRow = sqlx::query_as(
            r#"
            INSERT INTO audit_entries
                (id, timestamp, action, user_id, details, hash, previous_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, timestamp, action, user_id, details, hash, previous_hash, created_at
            "#,
        )
        .bind(entry.id)
        .bind(entry.timestamp)
        .bind(action.trim_matches('"'))
        .bind(entry.user_id)
        .bind(&details)
        .bind(&entry.hash)
        .bind(&entry.previous_hash)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create audit entry")?;

        tx.commit().await.context("Failed to commit audit entry")?;

        row.try_into()
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn record_import(&self, audit: ImportAudit) -> FieldOpsResult<()> {
        self.append(AuditEntry::for_import(audit))
            .await
            .map(|_| ())
            .map_err(|err| FieldOpsError::database(format!("{:#}", err)))
    }
}

#[derive(Debug, Clone, FromRow)]
struct AuditRow {
    id: Uuid,
    timestamp: DateTime<Utc>,
    action: String,
    user_id: Option<Uuid>,
    details: serde_json::Value,
    hash: String,
    previous_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = anyhow::Error;

    fn try_from(row: AuditRow) -> Result<Self> {
        let action: AuditAction = serde_json::from_str(&format!("\"{}\"", row.action))
            .with_context(|| format!("Unknown audit action '{}'", row.action))?;
        let details: AuditDetails =
            serde_json::from_value(row.details).context("Malformed audit details")?;

        Ok(Self {
            id: row.id,
            timestamp: row.timestamp,
            action,
            user_id: row.user_id,
            details,
            hash: row.hash,
            previous_hash: row.previous_hash,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldops_models::EntityKind;

    fn stored_row(entry: &AuditEntry) -> AuditRow {
        let action = serde_json::to_string(&entry.action).unwrap();
        AuditRow {
            id: entry.id,
            timestamp: entry.timestamp,
            action: action.trim_matches('"').to_string(),
            user_id: entry.user_id,
            details: serde_json::to_value(&entry.details).unwrap(),
            hash: entry.hash.clone(),
            previous_hash: entry.previous_hash.clone(),
            created_at: entry.created_at,
        }
    }

    fn import_entry() -> AuditEntry {
        let mut entry = AuditEntry::for_import(ImportAudit {
            actor_id: Uuid::new_v4(),
            kind: EntityKind::Contrats,
            created: 2,
            updated: 1,
            changes: Vec::new(),
        });
        entry.link_to(Some("0".repeat(64)));
        entry
    }

    #[test]
    fn test_stored_row_reads_back_with_intact_hash() {
        let entry = import_entry();
        let restored = AuditEntry::try_from(stored_row(&entry)).unwrap();

        assert_eq!(restored.hash, entry.hash);
        assert_eq!(restored.previous_hash, entry.previous_hash);
        assert_eq!(restored.details.created, 2);
        assert!(restored.verify_integrity());
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let mut row = stored_row(&import_entry());
        row.action = "purge".to_string();

        let err = AuditEntry::try_from(row).unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown audit action 'purge'"));
    }
}
