//! Import Engine
//!
//! Preview and commit share one validation pipeline:
//! parse, check the header, then per row coerce, resolve and de-duplicate.
//! Commit additionally writes every clean row inside a single transaction,
//! so a file is either fully applied or not applied at all.

use std::collections::HashMap;

use fieldops_models::{
    ChangeType, EntityKind, ImportAudit, ImportError, ImportResult, ImportRow, RecordChange,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::parser::TabularParser;
use super::resolver::Resolver;
use super::rules::{build_row, schema_for};
use super::store::{AuditSink, ImportStore, ImportTransaction};
use crate::config::ImportConfig;
use crate::error::{FieldOpsError, FieldOpsResult};
use crate::log_error;

/// Lifecycle of one commit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitState {
    Idle,
    /// Every row passed validation and resolution.
    ValidatedClean,
    /// At least one row carries an error; nothing will be written.
    ValidatedDirty,
    Committed,
    RolledBack,
}

impl CommitState {
    pub fn can_transition_to(&self, target: CommitState) -> bool {
        use CommitState::*;

        matches!(
            (self, target),
            (Idle, ValidatedClean)
                | (Idle, ValidatedDirty)
                | (ValidatedClean, Committed)
                | (ValidatedClean, RolledBack)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommitState::ValidatedDirty | CommitState::Committed | CommitState::RolledBack
        )
    }

    fn advance(&mut self, target: CommitState) -> FieldOpsResult<()> {
        if !self.can_transition_to(target) {
            return Err(FieldOpsError::internal(format!(
                "invalid commit transition {:?} -> {:?}",
                self, target
            )));
        }
        *self = target;
        Ok(())
    }
}

/// Output of the shared pipeline.
struct Validated {
    rows: Vec<(usize, ImportRow)>,
    errors: Vec<ImportError>,
    total: usize,
}

pub struct ImportEngine<S, A> {
    store: S,
    audit: A,
    parser: TabularParser,
}

impl<S: ImportStore, A: AuditSink> ImportEngine<S, A> {
    pub fn new(store: S, audit: A, config: &ImportConfig) -> Self {
        Self {
            store,
            audit,
            parser: TabularParser::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and resolve without writing anything.
    ///
    /// Only file-level problems are returned as `Err`; row problems land in
    /// the result's `errors` and the offending rows are left out of `preview`.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn preview(&self, kind: EntityKind, content: &str) -> FieldOpsResult<ImportResult> {
        let validated = self.validate(kind, content).await?;

        info!(
            kind = %kind,
            rows = validated.total,
            valid = validated.rows.len(),
            errors = validated.errors.len(),
            "Import preview completed"
        );

        let rows = validated.rows.into_iter().map(|(_, row)| row).collect();
        Ok(ImportResult::previewed(validated.errors, rows))
    }

    /// Validate, then upsert every row atomically.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn commit(
        &self,
        kind: EntityKind,
        content: &str,
        actor: Uuid,
    ) -> FieldOpsResult<ImportResult> {
        let mut state = CommitState::Idle;
        let validated = self.validate(kind, content).await?;

        if !validated.errors.is_empty() {
            state.advance(CommitState::ValidatedDirty)?;
            info!(
                kind = %kind,
                rows = validated.total,
                errors = validated.errors.len(),
                "Import rejected, nothing written"
            );
            return Ok(ImportResult::rejected(validated.errors));
        }
        state.advance(CommitState::ValidatedClean)?;

        let (created, updated, changes) = match self.persist(&validated.rows).await {
            Ok(outcome) => outcome,
            Err(err) => {
                state.advance(CommitState::RolledBack)?;
                log_error!(err, "Import rolled back", kind = %kind, rows = validated.total);
                return Err(err);
            }
        };
        state.advance(CommitState::Committed)?;

        info!(kind = %kind, rows = validated.total, created, updated, "Import committed");

        let audit = ImportAudit {
            actor_id: actor,
            kind,
            created,
            updated,
            changes,
        };
        // The data is already committed; an audit failure must not undo it.
        if let Err(err) = self.audit.record_import(audit).await {
            warn!(error = %err, kind = %kind, "Failed to hand off import audit");
        }

        Ok(ImportResult::committed(created, updated))
    }

    async fn validate(&self, kind: EntityKind, content: &str) -> FieldOpsResult<Validated> {
        let schema = schema_for(kind);
        let table = self.parser.parse(content)?;
        schema.check_header(&table)?;

        let mut resolver = Resolver::new(&self.store);
        let mut errors = Vec::new();
        let mut rows = Vec::new();
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        for parsed in &table.rows {
            let before = errors.len();
            let values = schema.validate_row(parsed, &mut errors);
            let built = build_row(kind, parsed.number, &values, &mut resolver, &mut errors).await?;

            let Some(row) = built.filter(|_| errors.len() == before) else {
                continue;
            };

            let key = row.natural_key().normalized();
            if let Some(first) = first_seen.get(&key) {
                errors.push(
                    ImportError::new(
                        parsed.number,
                        schema.key_column,
                        format!("duplicate of row {}", first),
                    )
                    .with_value(row.natural_key().to_string()),
                );
                continue;
            }
            first_seen.insert(key, parsed.number);
            rows.push((parsed.number, row));
        }

        tracing::debug!(lookups = resolver.cache().len(), "Reference lookups cached");

        Ok(Validated {
            rows,
            errors,
            total: table.rows.len(),
        })
    }

    async fn persist(
        &self,
        rows: &[(usize, ImportRow)],
    ) -> FieldOpsResult<(u32, u32, Vec<RecordChange>)> {
        let mut tx = self.store.begin().await.map_err(persistence)?;

        let mut created = 0;
        let mut updated = 0;
        let mut changes = Vec::with_capacity(rows.len());

        for (number, row) in rows {
            match upsert(&mut tx, row).await {
                Ok(change) => {
                    match change.change_type {
                        ChangeType::Created => created += 1,
                        ChangeType::Updated => updated += 1,
                    }
                    changes.push(change);
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed, transaction dropped");
                    }
                    return Err(FieldOpsError::persistence(format!(
                        "row {}: {}",
                        number,
                        err.into_message()
                    )));
                }
            }
        }

        tx.commit().await.map_err(persistence)?;
        Ok((created, updated, changes))
    }
}

/// Natural-key lookup, then update or create.
async fn upsert<T: ImportTransaction>(tx: &mut T, row: &ImportRow) -> FieldOpsResult<RecordChange> {
    let key = row.natural_key();

    let change = match tx.find_by_natural_key(&key).await? {
        Some(existing) => {
            let stored = tx.update(existing.id, row).await?;
            RecordChange {
                entity_id: stored.id,
                natural_key: key.to_string(),
                change_type: ChangeType::Updated,
                before: Some(existing.snapshot),
                after: stored.snapshot,
            }
        }
        None => {
            let stored = tx.create(row).await?;
            RecordChange {
                entity_id: stored.id,
                natural_key: key.to_string(),
                change_type: ChangeType::Created,
                before: None,
                after: stored.snapshot,
            }
        }
    };

    Ok(change)
}

fn persistence(err: FieldOpsError) -> FieldOpsError {
    match err {
        FieldOpsError::Persistence { .. } => err,
        other => FieldOpsError::persistence(other.into_message()),
    }
}

/// Body returned to callers when an import aborts before producing a result.
pub fn failure_result(err: &FieldOpsError) -> ImportResult {
    let field = match err {
        FieldOpsError::Parse { .. } => "_file",
        _ => "_commit",
    };
    ImportResult::failed(field, err.clone().into_message())
}
