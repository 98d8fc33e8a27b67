//! Contract Repository

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use fieldops_models::{Contrat, ContratRow};

use super::decode;

const SELECT_CONTRAT: &str = r#"
    SELECT c.id, c.reference, c.client_id, cl.nom_entreprise AS client_nom,
           c.type_contrat, c.date_debut, c.date_fin, c.frequence, c.statut,
           c.prestations, c.montant_ht, c.reconduction_tacite,
           c.created_at, c.updated_at
    FROM contrats c
    JOIN clients cl ON cl.id = c.client_id
"#;

pub struct ContratRepository {
    pool: PgPool,
}

impl ContratRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Contrat>> {
        let rows: Vec<ContratRecord> = sqlx::query_as(&format!("{} ORDER BY c.reference", SELECT_CONTRAT))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch all contracts")?;

        rows.into_iter()
            .map(|r| Contrat::try_from(r).context("Invalid contract row"))
            .collect()
    }

    /// `(contract id, owning client id)` for every contract with this reference
    pub async fn find_refs_by_reference(&self, reference: &str) -> Result<Vec<(Uuid, Uuid)>> {
        let refs: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT id, client_id FROM contrats WHERE LOWER(reference) = LOWER($1) ORDER BY created_at",
        )
        .bind(reference.trim())
        .fetch_all(&self.pool)
        .await
        .context("Failed to look up contracts by reference")?;

        Ok(refs)
    }
}

pub(crate) async fn fetch(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Contrat> {
    let row: ContratRecord = sqlx::query_as(&format!("{} WHERE c.id = $1", SELECT_CONTRAT))
        .bind(id)
        .fetch_one(conn)
        .await?;

    Contrat::try_from(row)
}

pub(crate) async fn find_id_by_reference(conn: &mut PgConnection, reference: &str) -> sqlx::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM contrats WHERE LOWER(reference) = LOWER($1) FOR UPDATE")
            .bind(reference.trim())
            .fetch_optional(conn)
            .await?;

    Ok(row.map(|(id,)| id))
}

pub(crate) async fn insert(conn: &mut PgConnection, row: &ContratRow) -> sqlx::Result<Uuid> {
    let now = Utc::now();

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO contrats
            (id, reference, client_id, type_contrat, date_debut, date_fin,
             frequence, statut, prestations, montant_ht, reconduction_tacite,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&row.reference)
    .bind(row.client_id)
    .bind(row.type_contrat.as_str())
    .bind(row.date_debut)
    .bind(row.date_fin)
    .bind(row.frequence.as_str())
    .bind(row.statut.as_str())
    .bind(&row.prestations)
    .bind(row.montant_ht)
    .bind(row.reconduction_tacite)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

pub(crate) async fn update(conn: &mut PgConnection, id: Uuid, row: &ContratRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE contrats SET
            reference = $2,
            client_id = $3,
            type_contrat = $4,
            date_debut = $5,
            date_fin = $6,
            frequence = $7,
            statut = $8,
            prestations = $9,
            montant_ht = $10,
            reconduction_tacite = $11,
            updated_at = $12
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&row.reference)
    .bind(row.client_id)
    .bind(row.type_contrat.as_str())
    .bind(row.date_debut)
    .bind(row.date_fin)
    .bind(row.frequence.as_str())
    .bind(row.statut.as_str())
    .bind(&row.prestations)
    .bind(row.montant_ht)
    .bind(row.reconduction_tacite)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

/// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct ContratRecord {
    id: Uuid,
    reference: String,
    client_id: Uuid,
    client_nom: String,
    type_contrat: String,
    date_debut: NaiveDate,
    date_fin: Option<NaiveDate>,
    frequence: String,
    statut: String,
    prestations: Vec<String>,
    montant_ht: Option<f64>,
    reconduction_tacite: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContratRecord> for Contrat {
    type Error = sqlx::Error;

    fn try_from(row: ContratRecord) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.id,
            reference: row.reference,
            client_id: row.client_id,
            client_nom: row.client_nom,
            type_contrat: decode(&row.type_contrat)?,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
            frequence: decode(&row.frequence)?,
            statut: decode(&row.statut)?,
            prestations: row.prestations,
            montant_ht: row.montant_ht,
            reconduction_tacite: row.reconduction_tacite,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
