//! Service contract models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocabulary::vocabulary;

vocabulary! {
    /// Nature of the service covered by a contract.
    ContratType: "contract type" {
        Maintenance => "maintenance",
        Entretien => "entretien",
        Depannage => "depannage",
        Installation => "installation",
        Inspection => "inspection",
    }
}

vocabulary! {
    /// How often planned interventions recur under a contract.
    Frequence: "frequency" {
        Ponctuelle => "ponctuelle",
        Hebdomadaire => "hebdomadaire",
        Mensuelle => "mensuelle",
        Trimestrielle => "trimestrielle",
        Semestrielle => "semestrielle",
        Annuelle => "annuelle",
    }
}

vocabulary! {
    ContratStatut: "contract status" {
        Brouillon => "brouillon",
        Actif => "actif",
        Suspendu => "suspendu",
        Termine => "termine",
    }
}

impl Default for ContratStatut {
    fn default() -> Self {
        Self::Actif
    }
}

/// Stored contract, joined with the owning client's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contrat {
    pub id: Uuid,
    pub reference: String,
    pub client_id: Uuid,
    pub client_nom: String,
    pub type_contrat: ContratType,
    pub date_debut: NaiveDate,
    pub date_fin: Option<NaiveDate>,
    pub frequence: Frequence,
    pub statut: ContratStatut,
    pub prestations: Vec<String>,
    pub montant_ht: Option<f64>,
    pub reconduction_tacite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One validated contract line of an import file, with its client resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContratRow {
    pub reference: String,
    pub client_nom: String,
    pub client_id: Uuid,
    pub type_contrat: ContratType,
    pub date_debut: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_fin: Option<NaiveDate>,
    pub frequence: Frequence,
    pub statut: ContratStatut,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prestations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub montant_ht: Option<f64>,
    pub reconduction_tacite: bool,
}

impl Contrat {
    pub fn from_row(row: &ContratRow) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference: row.reference.clone(),
            client_id: row.client_id,
            client_nom: row.client_nom.clone(),
            type_contrat: row.type_contrat,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
            frequence: row.frequence,
            statut: row.statut,
            prestations: row.prestations.clone(),
            montant_ht: row.montant_ht,
            reconduction_tacite: row.reconduction_tacite,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Contrat> for ContratRow {
    fn from(contrat: &Contrat) -> Self {
        Self {
            reference: contrat.reference.clone(),
            client_nom: contrat.client_nom.clone(),
            client_id: contrat.client_id,
            type_contrat: contrat.type_contrat,
            date_debut: contrat.date_debut,
            date_fin: contrat.date_fin,
            frequence: contrat.frequence,
            statut: contrat.statut,
            prestations: contrat.prestations.clone(),
            montant_ht: contrat.montant_ht,
            reconduction_tacite: contrat.reconduction_tacite,
        }
    }
}
