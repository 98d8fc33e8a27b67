use anyhow::{Context, Result};
use sqlx::PgPool;

/// Tables in dependency order. Every statement is idempotent.
const TABLES: &[(&str, &str)] = &[
    (
        "clients",
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            nom_entreprise VARCHAR(255) NOT NULL,
            siege_nom VARCHAR(255),
            siege_adresse VARCHAR(500),
            siege_code_postal VARCHAR(10),
            siege_ville VARCHAR(255),
            sites TEXT[] NOT NULL DEFAULT '{}',
            contact_nom VARCHAR(255),
            contact_email VARCHAR(255),
            contact_telephone VARCHAR(30),
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "postes",
        r#"
        CREATE TABLE IF NOT EXISTS postes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            nom VARCHAR(100) NOT NULL
        )
        "#,
    ),
    (
        "contrats",
        r#"
        CREATE TABLE IF NOT EXISTS contrats (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            reference VARCHAR(100) NOT NULL,
            client_id UUID NOT NULL REFERENCES clients(id),
            type_contrat VARCHAR(32) NOT NULL,
            date_debut DATE NOT NULL,
            date_fin DATE,
            frequence VARCHAR(32) NOT NULL,
            statut VARCHAR(32) NOT NULL DEFAULT 'actif',
            prestations TEXT[] NOT NULL DEFAULT '{}',
            montant_ht DOUBLE PRECISION CHECK (montant_ht >= 0),
            reconduction_tacite BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CHECK (date_fin IS NULL OR date_fin >= date_debut)
        )
        "#,
    ),
    (
        "interventions",
        r#"
        CREATE TABLE IF NOT EXISTS interventions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            client_id UUID NOT NULL REFERENCES clients(id),
            contrat_id UUID REFERENCES contrats(id),
            type_intervention VARCHAR(32) NOT NULL,
            date_prevue DATE NOT NULL,
            heure_prevue TIME,
            duree_minutes INTEGER CHECK (duree_minutes BETWEEN 1 AND 1440),
            statut VARCHAR(32) NOT NULL DEFAULT 'planifiee',
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "employes",
        r#"
        CREATE TABLE IF NOT EXISTS employes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            nom VARCHAR(100) NOT NULL,
            prenom VARCHAR(100) NOT NULL,
            email VARCHAR(255),
            telephone VARCHAR(30),
            actif BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "employe_postes",
        r#"
        CREATE TABLE IF NOT EXISTS employe_postes (
            employe_id UUID NOT NULL REFERENCES employes(id) ON DELETE CASCADE,
            poste_id UUID NOT NULL REFERENCES postes(id),
            PRIMARY KEY (employe_id, poste_id)
        )
        "#,
    ),
    (
        "audit_entries",
        r#"
        CREATE TABLE IF NOT EXISTS audit_entries (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            timestamp TIMESTAMPTZ NOT NULL,
            action VARCHAR NOT NULL,
            user_id UUID,
            details JSONB NOT NULL,
            hash VARCHAR NOT NULL,
            previous_hash VARCHAR,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

/// Natural keys are enforced here so concurrent imports cannot both create
/// the same record.
const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_clients_nom_entreprise ON clients (LOWER(nom_entreprise))",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_postes_nom ON postes (LOWER(nom))",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_contrats_reference ON contrats (LOWER(reference))",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_interventions_slot ON interventions \
     (client_id, type_intervention, date_prevue, COALESCE(heure_prevue, TIME '24:00:00'))",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_employes_nom_prenom ON employes (LOWER(nom), LOWER(prenom))",
    "CREATE INDEX IF NOT EXISTS idx_contrats_client_id ON contrats(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_interventions_date_prevue ON interventions(date_prevue)",
    "CREATE INDEX IF NOT EXISTS idx_audit_entries_timestamp ON audit_entries(timestamp)",
];

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Running PostgreSQL migrations");

    for (table, statement) in TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create table {}", table))?;
    }

    for statement in INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to run: {}", statement))?;
    }

    tracing::info!("PostgreSQL migrations completed successfully");
    Ok(())
}
