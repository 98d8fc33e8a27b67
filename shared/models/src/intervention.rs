//! Scheduled intervention models.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocabulary::vocabulary;

vocabulary! {
    InterventionType: "intervention type" {
        Preventive => "preventive",
        Corrective => "corrective",
        Installation => "installation",
        Controle => "controle",
        Depannage => "depannage",
    }
}

vocabulary! {
    /// Lifecycle of a field intervention.
    InterventionStatut: "intervention status" {
        Planifiee => "planifiee",
        EnCours => "en_cours",
        Terminee => "terminee",
        Annulee => "annulee",
    }
}

impl Default for InterventionStatut {
    fn default() -> Self {
        Self::Planifiee
    }
}

/// Stored intervention, joined with client name and contract reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Intervention {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_nom: String,
    pub contrat_id: Option<Uuid>,
    pub contrat_reference: Option<String>,
    pub type_intervention: InterventionType,
    pub date_prevue: NaiveDate,
    pub heure_prevue: Option<NaiveTime>,
    pub duree_minutes: Option<i32>,
    pub statut: InterventionStatut,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterventionRow {
    pub client_nom: String,
    pub client_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrat_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrat_id: Option<Uuid>,
    pub type_intervention: InterventionType,
    pub date_prevue: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heure_prevue: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duree_minutes: Option<i32>,
    pub statut: InterventionStatut,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Intervention {
    pub fn from_row(row: &InterventionRow) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id: row.client_id,
            client_nom: row.client_nom.clone(),
            contrat_id: row.contrat_id,
            contrat_reference: row.contrat_reference.clone(),
            type_intervention: row.type_intervention,
            date_prevue: row.date_prevue,
            heure_prevue: row.heure_prevue,
            duree_minutes: row.duree_minutes,
            statut: row.statut,
            description: row.description.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Intervention> for InterventionRow {
    fn from(intervention: &Intervention) -> Self {
        Self {
            client_nom: intervention.client_nom.clone(),
            client_id: intervention.client_id,
            contrat_reference: intervention.contrat_reference.clone(),
            contrat_id: intervention.contrat_id,
            type_intervention: intervention.type_intervention,
            date_prevue: intervention.date_prevue,
            heure_prevue: intervention.heure_prevue,
            duree_minutes: intervention.duree_minutes,
            statut: intervention.statut,
            description: intervention.description.clone(),
        }
    }
}
