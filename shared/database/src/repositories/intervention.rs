//! Intervention Repository

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use fieldops_models::{Intervention, InterventionRow, InterventionType};

use super::decode;

const SELECT_INTERVENTION: &str = r#"
    SELECT i.id, i.client_id, cl.nom_entreprise AS client_nom,
           i.contrat_id, ct.reference AS contrat_reference,
           i.type_intervention, i.date_prevue, i.heure_prevue, i.duree_minutes,
           i.statut, i.description, i.created_at, i.updated_at
    FROM interventions i
    JOIN clients cl ON cl.id = i.client_id
    LEFT JOIN contrats ct ON ct.id = i.contrat_id
"#;

pub struct InterventionRepository {
    pool: PgPool,
}

impl InterventionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All interventions in schedule order
    pub async fn find_all(&self) -> Result<Vec<Intervention>> {
        let rows: Vec<InterventionRecord> = sqlx::query_as(&format!(
            "{} ORDER BY i.date_prevue, i.heure_prevue NULLS FIRST",
            SELECT_INTERVENTION
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch all interventions")?;

        rows.into_iter()
            .map(|r| Intervention::try_from(r).context("Invalid intervention row"))
            .collect()
    }
}

pub(crate) async fn fetch(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Intervention> {
    let row: InterventionRecord = sqlx::query_as(&format!("{} WHERE i.id = $1", SELECT_INTERVENTION))
        .bind(id)
        .fetch_one(conn)
        .await?;

    Intervention::try_from(row)
}

/// A missing time is its own slot: it only matches another missing time.
pub(crate) async fn find_id_by_slot(
    conn: &mut PgConnection,
    client_id: Uuid,
    type_intervention: InterventionType,
    date_prevue: NaiveDate,
    heure_prevue: Option<NaiveTime>,
) -> sqlx::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM interventions
        WHERE client_id = $1
          AND type_intervention = $2
          AND date_prevue = $3
          AND heure_prevue IS NOT DISTINCT FROM $4
        FOR UPDATE
        "#,
    )
    .bind(client_id)
    .bind(type_intervention.as_str())
    .bind(date_prevue)
    .bind(heure_prevue)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|(id,)| id))
}

pub(crate) async fn insert(conn: &mut PgConnection, row: &InterventionRow) -> sqlx::Result<Uuid> {
    let now = Utc::now();

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO interventions
            (id, client_id, contrat_id, type_intervention, date_prevue, heure_prevue,
             duree_minutes, statut, description, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(row.client_id)
    .bind(row.contrat_id)
    .bind(row.type_intervention.as_str())
    .bind(row.date_prevue)
    .bind(row.heure_prevue)
    .bind(row.duree_minutes)
    .bind(row.statut.as_str())
    .bind(&row.description)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

pub(crate) async fn update(conn: &mut PgConnection, id: Uuid, row: &InterventionRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE interventions SET
            client_id = $2,
            contrat_id = $3,
            type_intervention = $4,
            date_prevue = $5,
            heure_prevue = $6,
            duree_minutes = $7,
            statut = $8,
            description = $9,
            updated_at = $10
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(row.client_id)
    .bind(row.contrat_id)
    .bind(row.type_intervention.as_str())
    .bind(row.date_prevue)
    .bind(row.heure_prevue)
    .bind(row.duree_minutes)
    .bind(row.statut.as_str())
    .bind(&row.description)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

#[derive(Debug, FromRow)]
struct InterventionRecord {
    id: Uuid,
    client_id: Uuid,
    client_nom: String,
    contrat_id: Option<Uuid>,
    contrat_reference: Option<String>,
    type_intervention: String,
    date_prevue: NaiveDate,
    heure_prevue: Option<NaiveTime>,
    duree_minutes: Option<i32>,
    statut: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InterventionRecord> for Intervention {
    type Error = sqlx::Error;

    fn try_from(row: InterventionRecord) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            client_nom: row.client_nom,
            contrat_id: row.contrat_id,
            contrat_reference: row.contrat_reference,
            type_intervention: decode(&row.type_intervention)?,
            date_prevue: row.date_prevue,
            heure_prevue: row.heure_prevue,
            duree_minutes: row.duree_minutes,
            statut: decode(&row.statut)?,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
