//! Collaborator contracts of the import engine.
//!
//! The engine never talks to a database directly. Storage backends implement
//! [`ReferenceLookup`] for read-only resolution, [`ImportStore`] for the
//! transactional upsert phase and [`ExportSource`] for exports. Audit
//! persistence is delegated to an [`AuditSink`].

use async_trait::async_trait;
use fieldops_models::{Client, Contrat, Employe, ImportAudit, ImportRow, Intervention, NaturalKey};
use uuid::Uuid;

use crate::error::FieldOpsResult;

/// Identity of a contract together with its owning client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContratRef {
    pub id: Uuid,
    pub client_id: Uuid,
}

/// A stored record as seen inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Uuid,
    pub snapshot: serde_json::Value,
}

/// Read-only lookups used to turn human references into identifiers.
/// All name matches are case-insensitive and exact.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    async fn find_clients_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>>;

    async fn find_contrats_by_reference(&self, reference: &str) -> FieldOpsResult<Vec<ContratRef>>;

    async fn find_postes_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>>;
}

/// One write transaction. Dropping it without calling [`commit`] discards
/// every write made through it.
///
/// [`commit`]: ImportTransaction::commit
#[async_trait]
pub trait ImportTransaction: Send {
    async fn find_by_natural_key(&mut self, key: &NaturalKey) -> FieldOpsResult<Option<StoredRecord>>;

    async fn create(&mut self, row: &ImportRow) -> FieldOpsResult<StoredRecord>;

    async fn update(&mut self, id: Uuid, row: &ImportRow) -> FieldOpsResult<StoredRecord>;

    async fn commit(self) -> FieldOpsResult<()>;

    async fn rollback(self) -> FieldOpsResult<()>;
}

#[async_trait]
pub trait ImportStore: ReferenceLookup {
    type Transaction: ImportTransaction;

    async fn begin(&self) -> FieldOpsResult<Self::Transaction>;
}

#[async_trait]
pub trait ExportSource: Send + Sync {
    async fn list_clients(&self) -> FieldOpsResult<Vec<Client>>;

    async fn list_contrats(&self) -> FieldOpsResult<Vec<Contrat>>;

    async fn list_interventions(&self) -> FieldOpsResult<Vec<Intervention>>;

    async fn list_employes(&self) -> FieldOpsResult<Vec<Employe>>;
}

/// Receives the before/after summary of every successful commit.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_import(&self, audit: ImportAudit) -> FieldOpsResult<()>;
}
