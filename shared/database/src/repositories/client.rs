//! Client Repository
//!
//! Pool-level reads for clients, plus the connection-level statements the
//! import transaction runs. Uses runtime SQL queries (unchecked) to avoid
//! requiring DATABASE_URL at compile time.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use fieldops_models::{Client, ClientRow};

const SELECT_CLIENT: &str = r#"
    SELECT id, nom_entreprise, siege_nom, siege_adresse, siege_code_postal,
           siege_ville, sites, contact_nom, contact_email, contact_telephone,
           notes, created_at, updated_at
    FROM clients
"#;

pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All clients, ordered by company name
    pub async fn find_all(&self) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!("{} ORDER BY nom_entreprise", SELECT_CLIENT))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch all clients")?;

        Ok(clients)
    }

    /// Ids of every client whose company name matches, ignoring case
    pub async fn find_ids_by_name(&self, name: &str) -> Result<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM clients WHERE LOWER(nom_entreprise) = LOWER($1) ORDER BY created_at",
        )
        .bind(name.trim())
        .fetch_all(&self.pool)
        .await
        .context("Failed to look up clients by name")?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

pub(crate) async fn fetch(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Client> {
    sqlx::query_as::<_, Client>(&format!("{} WHERE id = $1", SELECT_CLIENT))
        .bind(id)
        .fetch_one(conn)
        .await
}

pub(crate) async fn find_by_name(conn: &mut PgConnection, name: &str) -> sqlx::Result<Option<Client>> {
    sqlx::query_as::<_, Client>(&format!(
        "{} WHERE LOWER(nom_entreprise) = LOWER($1) FOR UPDATE",
        SELECT_CLIENT
    ))
    .bind(name.trim())
    .fetch_optional(conn)
    .await
}

pub(crate) async fn insert(conn: &mut PgConnection, row: &ClientRow) -> sqlx::Result<Client> {
    let now = Utc::now();

    sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients
            (id, nom_entreprise, siege_nom, siege_adresse, siege_code_postal,
             siege_ville, sites, contact_nom, contact_email, contact_telephone,
             notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        RETURNING id, nom_entreprise, siege_nom, siege_adresse, siege_code_postal,
                  siege_ville, sites, contact_nom, contact_email, contact_telephone,
                  notes, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&row.nom_entreprise)
    .bind(&row.siege_nom)
    .bind(&row.siege_adresse)
    .bind(&row.siege_code_postal)
    .bind(&row.siege_ville)
    .bind(&row.sites)
    .bind(&row.contact_nom)
    .bind(&row.contact_email)
    .bind(&row.contact_telephone)
    .bind(&row.notes)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub(crate) async fn update(conn: &mut PgConnection, id: Uuid, row: &ClientRow) -> sqlx::Result<Client> {
    sqlx::query_as::<_, Client>(
        r#"
        UPDATE clients SET
            nom_entreprise = $2,
            siege_nom = $3,
            siege_adresse = $4,
            siege_code_postal = $5,
            siege_ville = $6,
            sites = $7,
            contact_nom = $8,
            contact_email = $9,
            contact_telephone = $10,
            notes = $11,
            updated_at = $12
        WHERE id = $1
        RETURNING id, nom_entreprise, siege_nom, siege_adresse, siege_code_postal,
                  siege_ville, sites, contact_nom, contact_email, contact_telephone,
                  notes, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&row.nom_entreprise)
    .bind(&row.siege_nom)
    .bind(&row.siege_adresse)
    .bind(&row.siege_code_postal)
    .bind(&row.siege_ville)
    .bind(&row.sites)
    .bind(&row.contact_nom)
    .bind(&row.contact_email)
    .bind(&row.contact_telephone)
    .bind(&row.notes)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}
