//! Client domain models.
//!
//! A client is a company served by the field teams. It owns a head-office
//! site, a list of additional site names and a primary contact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored client record, as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Client {
    pub id: Uuid,
    pub nom_entreprise: String,
    pub siege_nom: Option<String>,
    pub siege_adresse: Option<String>,
    pub siege_code_postal: Option<String>,
    pub siege_ville: Option<String>,
    pub sites: Vec<String>,
    pub contact_nom: Option<String>,
    pub contact_email: Option<String>,
    pub contact_telephone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One validated client line of an import file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientRow {
    pub nom_entreprise: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siege_nom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siege_adresse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siege_code_postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siege_ville: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_nom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Client {
    pub fn new(nom_entreprise: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            nom_entreprise: nom_entreprise.into(),
            siege_nom: None,
            siege_adresse: None,
            siege_code_postal: None,
            siege_ville: None,
            sites: Vec::new(),
            contact_nom: None,
            contact_email: None,
            contact_telephone: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every importable field with the values of `row`.
    pub fn apply_row(&mut self, row: &ClientRow) {
        self.nom_entreprise = row.nom_entreprise.clone();
        self.siege_nom = row.siege_nom.clone();
        self.siege_adresse = row.siege_adresse.clone();
        self.siege_code_postal = row.siege_code_postal.clone();
        self.siege_ville = row.siege_ville.clone();
        self.sites = row.sites.clone();
        self.contact_nom = row.contact_nom.clone();
        self.contact_email = row.contact_email.clone();
        self.contact_telephone = row.contact_telephone.clone();
        self.notes = row.notes.clone();
        self.updated_at = Utc::now();
    }
}

impl From<&Client> for ClientRow {
    fn from(client: &Client) -> Self {
        Self {
            nom_entreprise: client.nom_entreprise.clone(),
            siege_nom: client.siege_nom.clone(),
            siege_adresse: client.siege_adresse.clone(),
            siege_code_postal: client.siege_code_postal.clone(),
            siege_ville: client.siege_ville.clone(),
            sites: client.sites.clone(),
            contact_nom: client.contact_nom.clone(),
            contact_email: client.contact_email.clone(),
            contact_telephone: client.contact_telephone.clone(),
            notes: client.notes.clone(),
        }
    }
}
