//! Employee and post repositories
//!
//! Posts are a controlled vocabulary: imports reference them by name and
//! never create them. An employee's posts live in the `employe_postes` join
//! table and are replaced wholesale on update.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use fieldops_models::{Employe, EmployeRow};

const SELECT_EMPLOYE: &str = r#"
    SELECT e.id, e.nom, e.prenom, e.email, e.telephone,
           ARRAY(
               SELECT p.nom FROM employe_postes ep
               JOIN postes p ON p.id = ep.poste_id
               WHERE ep.employe_id = e.id
               ORDER BY p.nom
           ) AS postes,
           e.actif, e.created_at, e.updated_at
    FROM employes e
"#;

pub struct EmployeRepository {
    pool: PgPool,
}

impl EmployeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Employe>> {
        let employes = sqlx::query_as::<_, Employe>(&format!("{} ORDER BY e.nom, e.prenom", SELECT_EMPLOYE))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch all employees")?;

        Ok(employes)
    }
}

pub struct PosteRepository {
    pool: PgPool,
}

impl PosteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_ids_by_name(&self, nom: &str) -> Result<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM postes WHERE LOWER(nom) = LOWER($1)")
            .bind(nom.trim())
            .fetch_all(&self.pool)
            .await
            .context("Failed to look up posts by name")?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

pub(crate) async fn fetch(conn: &mut PgConnection, id: Uuid) -> sqlx::Result<Employe> {
    sqlx::query_as::<_, Employe>(&format!("{} WHERE e.id = $1", SELECT_EMPLOYE))
        .bind(id)
        .fetch_one(conn)
        .await
}

pub(crate) async fn find_id_by_name(conn: &mut PgConnection, nom: &str, prenom: &str) -> sqlx::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM employes WHERE LOWER(nom) = LOWER($1) AND LOWER(prenom) = LOWER($2) FOR UPDATE",
    )
    .bind(nom.trim())
    .bind(prenom.trim())
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|(id,)| id))
}

pub(crate) async fn insert(conn: &mut PgConnection, row: &EmployeRow) -> sqlx::Result<Uuid> {
    let now = Utc::now();

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO employes (id, nom, prenom, email, telephone, actif, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&row.nom)
    .bind(&row.prenom)
    .bind(&row.email)
    .bind(&row.telephone)
    .bind(row.actif)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    assign_postes(conn, id, &row.poste_ids).await?;
    Ok(id)
}

pub(crate) async fn update(conn: &mut PgConnection, id: Uuid, row: &EmployeRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE employes SET
            nom = $2,
            prenom = $3,
            email = $4,
            telephone = $5,
            actif = $6,
            updated_at = $7
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&row.nom)
    .bind(&row.prenom)
    .bind(&row.email)
    .bind(&row.telephone)
    .bind(row.actif)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM employe_postes WHERE employe_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    assign_postes(conn, id, &row.poste_ids).await
}

async fn assign_postes(conn: &mut PgConnection, employe_id: Uuid, poste_ids: &[Uuid]) -> sqlx::Result<()> {
    for poste_id in poste_ids {
        sqlx::query("INSERT INTO employe_postes (employe_id, poste_id) VALUES ($1, $2)")
            .bind(employe_id)
            .bind(poste_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
