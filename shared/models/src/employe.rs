//! Staff and post (role) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Entry of the controlled post vocabulary ("Technicien", "Chef d'équipe", ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Poste {
    pub id: Uuid,
    pub nom: String,
}

impl Poste {
    pub fn new(nom: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            nom: nom.into(),
        }
    }
}

/// Stored employee with the names of the posts held.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Employe {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub postes: Vec<String>,
    pub actif: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeRow {
    pub nom: String,
    pub prenom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub postes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub poste_ids: Vec<Uuid>,
    pub actif: bool,
}

impl Employe {
    pub fn from_row(row: &EmployeRow) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            nom: row.nom.clone(),
            prenom: row.prenom.clone(),
            email: row.email.clone(),
            telephone: row.telephone.clone(),
            postes: row.postes.clone(),
            actif: row.actif,
            created_at: now,
            updated_at: now,
        }
    }
}
