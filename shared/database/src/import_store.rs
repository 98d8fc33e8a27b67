//! PostgreSQL backend of the import engine.
//!
//! Reference lookups and exports read through the pool. The write phase of
//! a commit runs every statement on one `sqlx::Transaction`; dropping it
//! without committing rolls everything back.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use fieldops_models::{Client, Contrat, Employe, ImportRow, Intervention, NaturalKey};
use fieldops_utils::import::{
    ContratRef, ExportSource, ImportStore, ImportTransaction, ReferenceLookup, StoredRecord,
};
use fieldops_utils::{FieldOpsError, FieldOpsResult};

use crate::repositories::{
    client, contrat, employe, intervention, ClientRepository, ContratRepository,
    EmployeRepository, InterventionRepository, PosteRepository,
};

fn storage_error(err: anyhow::Error) -> FieldOpsError {
    FieldOpsError::database(format!("{:#}", err))
}

fn stored<T: Serialize>(id: Uuid, entity: &T) -> FieldOpsResult<StoredRecord> {
    Ok(StoredRecord {
        id,
        snapshot: serde_json::to_value(entity)?,
    })
}

pub struct PgImportStore {
    pool: PgPool,
    clients: ClientRepository,
    contrats: ContratRepository,
    interventions: InterventionRepository,
    employes: EmployeRepository,
    postes: PosteRepository,
}

impl PgImportStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            clients: ClientRepository::new(pool.clone()),
            contrats: ContratRepository::new(pool.clone()),
            interventions: InterventionRepository::new(pool.clone()),
            employes: EmployeRepository::new(pool.clone()),
            postes: PosteRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl ReferenceLookup for PgImportStore {
    async fn find_clients_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
        self.clients.find_ids_by_name(name).await.map_err(storage_error)
    }

    async fn find_contrats_by_reference(&self, reference: &str) -> FieldOpsResult<Vec<ContratRef>> {
        let refs = self
            .contrats
            .find_refs_by_reference(reference)
            .await
            .map_err(storage_error)?;

        Ok(refs
            .into_iter()
            .map(|(id, client_id)| ContratRef { id, client_id })
            .collect())
    }

    async fn find_postes_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
        self.postes.find_ids_by_name(name).await.map_err(storage_error)
    }
}

#[async_trait]
impl ImportStore for PgImportStore {
    type Transaction = PgImportTransaction;

    async fn begin(&self) -> FieldOpsResult<PgImportTransaction> {
        let tx = self.pool.begin().await?;
        Ok(PgImportTransaction { tx })
    }
}

#[async_trait]
impl ExportSource for PgImportStore {
    async fn list_clients(&self) -> FieldOpsResult<Vec<Client>> {
        self.clients.find_all().await.map_err(storage_error)
    }

    async fn list_contrats(&self) -> FieldOpsResult<Vec<Contrat>> {
        self.contrats.find_all().await.map_err(storage_error)
    }

    async fn list_interventions(&self) -> FieldOpsResult<Vec<Intervention>> {
        self.interventions.find_all().await.map_err(storage_error)
    }

    async fn list_employes(&self) -> FieldOpsResult<Vec<Employe>> {
        self.employes.find_all().await.map_err(storage_error)
    }
}

pub struct PgImportTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgImportTransaction {
    async fn snapshot(&mut self, kind: &ImportRow, id: Uuid) -> FieldOpsResult<StoredRecord> {
        match kind {
            ImportRow::Client(_) => stored(id, &client::fetch(&mut self.tx, id).await?),
            ImportRow::Contrat(_) => stored(id, &contrat::fetch(&mut self.tx, id).await?),
            ImportRow::Intervention(_) => stored(id, &intervention::fetch(&mut self.tx, id).await?),
            ImportRow::Employe(_) => stored(id, &employe::fetch(&mut self.tx, id).await?),
        }
    }
}

#[async_trait]
impl ImportTransaction for PgImportTransaction {
    async fn find_by_natural_key(&mut self, key: &NaturalKey) -> FieldOpsResult<Option<StoredRecord>> {
        let conn = &mut *self.tx;

        let record = match key {
            NaturalKey::Client { nom_entreprise } => client::find_by_name(&mut *conn, nom_entreprise)
                .await?
                .map(|c| stored(c.id, &c))
                .transpose()?,
            NaturalKey::Contrat { reference } => match contrat::find_id_by_reference(&mut *conn, reference).await? {
                Some(id) => Some(stored(id, &contrat::fetch(conn, id).await?)?),
                None => None,
            },
            NaturalKey::Intervention {
                client_id,
                type_intervention,
                date_prevue,
                heure_prevue,
            } => {
                let found = intervention::find_id_by_slot(
                    &mut *conn,
                    *client_id,
                    *type_intervention,
                    *date_prevue,
                    *heure_prevue,
                )
                .await?;
                match found {
                    Some(id) => Some(stored(id, &intervention::fetch(conn, id).await?)?),
                    None => None,
                }
            }
            NaturalKey::Employe { nom, prenom } => match employe::find_id_by_name(&mut *conn, nom, prenom).await? {
                Some(id) => Some(stored(id, &employe::fetch(conn, id).await?)?),
                None => None,
            },
        };

        Ok(record)
    }

    async fn create(&mut self, row: &ImportRow) -> FieldOpsResult<StoredRecord> {
        let id = match row {
            ImportRow::Client(data) => {
                let created = client::insert(&mut self.tx, data).await?;
                return stored(created.id, &created);
            }
            ImportRow::Contrat(data) => contrat::insert(&mut self.tx, data).await?,
            ImportRow::Intervention(data) => intervention::insert(&mut self.tx, data).await?,
            ImportRow::Employe(data) => employe::insert(&mut self.tx, data).await?,
        };

        self.snapshot(row, id).await
    }

    async fn update(&mut self, id: Uuid, row: &ImportRow) -> FieldOpsResult<StoredRecord> {
        match row {
            ImportRow::Client(data) => {
                let updated = client::update(&mut self.tx, id, data).await?;
                return stored(id, &updated);
            }
            ImportRow::Contrat(data) => contrat::update(&mut self.tx, id, data).await?,
            ImportRow::Intervention(data) => intervention::update(&mut self.tx, id, data).await?,
            ImportRow::Employe(data) => employe::update(&mut self.tx, id, data).await?,
        }

        self.snapshot(row, id).await
    }

    async fn commit(self) -> FieldOpsResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> FieldOpsResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
