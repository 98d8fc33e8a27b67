//! In-memory storage backend.
//!
//! Implements the full import storage contract over plain vectors guarded by
//! a `tokio` lock. Transactions work on a private copy that replaces the
//! shared state on commit. Used by the test suites and for local dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fieldops_models::{
    Client, Contrat, Employe, ImportAudit, ImportRow, Intervention, NaturalKey, Poste,
};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{
    AuditSink, ContratRef, ExportSource, ImportStore, ImportTransaction, ReferenceLookup,
    StoredRecord,
};
use crate::error::{FieldOpsError, FieldOpsResult};

#[derive(Debug, Clone, Default)]
struct State {
    clients: Vec<Client>,
    contrats: Vec<Contrat>,
    interventions: Vec<Intervention>,
    employes: Vec<Employe>,
    postes: Vec<Poste>,
}

#[derive(Debug, Default)]
struct Inner {
    state: State,
    /// Writes allowed per transaction before the next one fails.
    fail_after_writes: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

fn same(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn snapshot<T: Serialize>(id: Uuid, entity: &T) -> FieldOpsResult<StoredRecord> {
    Ok(StoredRecord {
        id,
        snapshot: serde_json::to_value(entity)?,
    })
}

fn client_key(client: &Client) -> NaturalKey {
    NaturalKey::Client {
        nom_entreprise: client.nom_entreprise.clone(),
    }
}

fn contrat_key(contrat: &Contrat) -> NaturalKey {
    NaturalKey::Contrat {
        reference: contrat.reference.clone(),
    }
}

fn intervention_key(intervention: &Intervention) -> NaturalKey {
    NaturalKey::Intervention {
        client_id: intervention.client_id,
        type_intervention: intervention.type_intervention,
        date_prevue: intervention.date_prevue,
        heure_prevue: intervention.heure_prevue,
    }
}

fn employe_key(employe: &Employe) -> NaturalKey {
    NaturalKey::Employe {
        nom: employe.nom.clone(),
        prenom: employe.prenom.clone(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following transaction fail on its `n + 1`-th write.
    pub async fn fail_after_writes(&self, n: usize) {
        self.inner.write().await.fail_after_writes = Some(n);
    }

    pub async fn insert_client(&self, client: Client) {
        self.inner.write().await.state.clients.push(client);
    }

    pub async fn insert_contrat(&self, contrat: Contrat) {
        self.inner.write().await.state.contrats.push(contrat);
    }

    pub async fn insert_poste(&self, nom: &str) -> Uuid {
        let poste = Poste::new(nom);
        let id = poste.id;
        self.inner.write().await.state.postes.push(poste);
        id
    }

    pub async fn clients(&self) -> Vec<Client> {
        self.inner.read().await.state.clients.clone()
    }

    pub async fn contrats(&self) -> Vec<Contrat> {
        self.inner.read().await.state.contrats.clone()
    }

    pub async fn interventions(&self) -> Vec<Intervention> {
        self.inner.read().await.state.interventions.clone()
    }

    pub async fn employes(&self) -> Vec<Employe> {
        self.inner.read().await.state.employes.clone()
    }
}

#[async_trait]
impl ReferenceLookup for MemoryStore {
    async fn find_clients_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .state
            .clients
            .iter()
            .filter(|c| same(&c.nom_entreprise, name))
            .map(|c| c.id)
            .collect())
    }

    async fn find_contrats_by_reference(&self, reference: &str) -> FieldOpsResult<Vec<ContratRef>> {
        let inner = self.inner.read().await;
        Ok(inner
            .state
            .contrats
            .iter()
            .filter(|c| same(&c.reference, reference))
            .map(|c| ContratRef {
                id: c.id,
                client_id: c.client_id,
            })
            .collect())
    }

    async fn find_postes_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .state
            .postes
            .iter()
            .filter(|p| same(&p.nom, name))
            .map(|p| p.id)
            .collect())
    }
}

#[async_trait]
impl ImportStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> FieldOpsResult<MemoryTransaction> {
        let inner = self.inner.read().await;
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.inner),
            working: inner.state.clone(),
            writes: 0,
            fail_after_writes: inner.fail_after_writes,
        })
    }
}

#[async_trait]
impl ExportSource for MemoryStore {
    async fn list_clients(&self) -> FieldOpsResult<Vec<Client>> {
        Ok(self.clients().await)
    }

    async fn list_contrats(&self) -> FieldOpsResult<Vec<Contrat>> {
        Ok(self.contrats().await)
    }

    async fn list_interventions(&self) -> FieldOpsResult<Vec<Intervention>> {
        Ok(self.interventions().await)
    }

    async fn list_employes(&self) -> FieldOpsResult<Vec<Employe>> {
        Ok(self.employes().await)
    }
}

/// Write scope over a private copy of the store. Dropping it discards the copy.
#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<RwLock<Inner>>,
    working: State,
    writes: usize,
    fail_after_writes: Option<usize>,
}

impl MemoryTransaction {
    fn count_write(&mut self) -> FieldOpsResult<()> {
        if self.fail_after_writes.is_some_and(|limit| self.writes >= limit) {
            return Err(FieldOpsError::database("injected write failure"));
        }
        self.writes += 1;
        Ok(())
    }

    /// Unique-index emulation: no other record may carry the same key.
    fn ensure_unique(&self, key: &NaturalKey, except: Option<Uuid>) -> FieldOpsResult<()> {
        let taken = self.find(key).is_some_and(|(id, _)| Some(id) != except);
        if taken {
            return Err(FieldOpsError::conflict(format!(
                "duplicate key value violates unique constraint on {} '{}'",
                key.kind(),
                key
            )));
        }
        Ok(())
    }

    fn find(&self, key: &NaturalKey) -> Option<(Uuid, FieldOpsResult<serde_json::Value>)> {
        let normalized = key.normalized();
        let state = &self.working;

        let found = match key {
            NaturalKey::Client { .. } => state
                .clients
                .iter()
                .find(|c| client_key(c).normalized() == normalized)
                .map(|c| (c.id, serde_json::to_value(c))),
            NaturalKey::Contrat { .. } => state
                .contrats
                .iter()
                .find(|c| contrat_key(c).normalized() == normalized)
                .map(|c| (c.id, serde_json::to_value(c))),
            NaturalKey::Intervention { .. } => state
                .interventions
                .iter()
                .find(|i| intervention_key(i).normalized() == normalized)
                .map(|i| (i.id, serde_json::to_value(i))),
            NaturalKey::Employe { .. } => state
                .employes
                .iter()
                .find(|e| employe_key(e).normalized() == normalized)
                .map(|e| (e.id, serde_json::to_value(e))),
        };

        found.map(|(id, value)| (id, value.map_err(FieldOpsError::from)))
    }

    fn poste_names(&self, ids: &[Uuid], fallback: &[String]) -> Vec<String> {
        let names: Vec<String> = ids
            .iter()
            .filter_map(|id| self.working.postes.iter().find(|p| p.id == *id))
            .map(|p| p.nom.clone())
            .collect();
        if names.is_empty() {
            fallback.to_vec()
        } else {
            names
        }
    }

    fn not_found(kind: &str, id: Uuid) -> FieldOpsError {
        FieldOpsError::not_found(format!("{} {}", kind, id))
    }
}

#[async_trait]
impl ImportTransaction for MemoryTransaction {
    async fn find_by_natural_key(&mut self, key: &NaturalKey) -> FieldOpsResult<Option<StoredRecord>> {
        match self.find(key) {
            Some((id, value)) => Ok(Some(StoredRecord { id, snapshot: value? })),
            None => Ok(None),
        }
    }

    async fn create(&mut self, row: &ImportRow) -> FieldOpsResult<StoredRecord> {
        self.ensure_unique(&row.natural_key(), None)?;
        self.count_write()?;

        match row {
            ImportRow::Client(row) => {
                let mut client = Client::new(row.nom_entreprise.clone());
                client.apply_row(row);
                let stored = snapshot(client.id, &client)?;
                self.working.clients.push(client);
                Ok(stored)
            }
            ImportRow::Contrat(row) => {
                let contrat = Contrat::from_row(row);
                let stored = snapshot(contrat.id, &contrat)?;
                self.working.contrats.push(contrat);
                Ok(stored)
            }
            ImportRow::Intervention(row) => {
                let intervention = Intervention::from_row(row);
                let stored = snapshot(intervention.id, &intervention)?;
                self.working.interventions.push(intervention);
                Ok(stored)
            }
            ImportRow::Employe(row) => {
                let mut employe = Employe::from_row(row);
                employe.postes = self.poste_names(&row.poste_ids, &row.postes);
                let stored = snapshot(employe.id, &employe)?;
                self.working.employes.push(employe);
                Ok(stored)
            }
        }
    }

    async fn update(&mut self, id: Uuid, row: &ImportRow) -> FieldOpsResult<StoredRecord> {
        self.ensure_unique(&row.natural_key(), Some(id))?;
        self.count_write()?;

        match row {
            ImportRow::Client(row) => {
                let client = self
                    .working
                    .clients
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| Self::not_found("client", id))?;
                client.apply_row(row);
                snapshot(id, &*client)
            }
            ImportRow::Contrat(row) => {
                let contrat = self
                    .working
                    .contrats
                    .iter_mut()
                    .find(|c| c.id == id)
                    .ok_or_else(|| Self::not_found("contrat", id))?;
                *contrat = Contrat {
                    id,
                    created_at: contrat.created_at,
                    ..Contrat::from_row(row)
                };
                snapshot(id, &*contrat)
            }
            ImportRow::Intervention(row) => {
                let intervention = self
                    .working
                    .interventions
                    .iter_mut()
                    .find(|i| i.id == id)
                    .ok_or_else(|| Self::not_found("intervention", id))?;
                *intervention = Intervention {
                    id,
                    created_at: intervention.created_at,
                    ..Intervention::from_row(row)
                };
                snapshot(id, &*intervention)
            }
            ImportRow::Employe(row) => {
                let postes = self.poste_names(&row.poste_ids, &row.postes);
                let employe = self
                    .working
                    .employes
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| Self::not_found("employe", id))?;
                *employe = Employe {
                    id,
                    postes,
                    created_at: employe.created_at,
                    updated_at: Utc::now(),
                    ..Employe::from_row(row)
                };
                snapshot(id, &*employe)
            }
        }
    }

    async fn commit(self) -> FieldOpsResult<()> {
        self.shared.write().await.state = self.working;
        Ok(())
    }

    async fn rollback(self) -> FieldOpsResult<()> {
        Ok(())
    }
}

/// Audit sink that keeps every hand-off in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<RwLock<Vec<ImportAudit>>>,
}

impl MemoryAuditSink {
    pub async fn records(&self) -> Vec<ImportAudit> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record_import(&self, audit: ImportAudit) -> FieldOpsResult<()> {
        self.records.write().await.push(audit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldops_models::ClientRow;

    fn client_row(nom: &str) -> ImportRow {
        ImportRow::Client(ClientRow {
            nom_entreprise: nom.to_string(),
            ..ClientRow::default()
        })
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_leaves_store_untouched() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.create(&client_row("Acme")).await.unwrap();
        drop(tx);
        assert!(store.clients().await.is_empty());

        let mut tx = store.begin().await.unwrap();
        tx.create(&client_row("Acme")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.clients().await.len(), 1);
    }

    #[tokio::test]
    async fn test_natural_keys_are_unique() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        tx.create(&client_row("Acme")).await.unwrap();
        let err = tx.create(&client_row(" ACME ")).await.unwrap_err();
        assert_eq!(err.error_code(), "CONFLICT");

        let found = tx
            .find_by_natural_key(&NaturalKey::Client {
                nom_entreprise: "acme".to_string(),
            })
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_after_writes(1).await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.create(&client_row("A")).await.is_ok());
        assert!(tx.create(&client_row("B")).await.is_err());
    }
}
