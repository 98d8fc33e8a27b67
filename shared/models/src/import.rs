//! Bulk import result types.
//!
//! These are the values handed back to callers of the preview and execute
//! operations. They are built fresh for every call and never stored.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocabulary::vocabulary;
use crate::{ClientRow, ContratRow, EmployeRow, InterventionRow, InterventionType};

vocabulary! {
    /// Entity kinds accepted by the bulk import and export endpoints.
    EntityKind: "import type" {
        Clients => "clients",
        Contrats => "contrats",
        Interventions => "interventions",
        Employes => "employes",
    }
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Clients,
        EntityKind::Contrats,
        EntityKind::Interventions,
        EntityKind::Employes,
    ];
}

/// One diagnostic attached to an input row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportError {
    /// 1-based row number, header excluded. `0` for file-level failures.
    pub row: usize,
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ImportError {
    pub fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Outcome of a preview or execute call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportResult {
    pub success: bool,
    pub created: u32,
    pub updated: u32,
    pub errors: Vec<ImportError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<ImportRow>>,
}

impl ImportResult {
    /// Result of a dry run: no counts, every clean row listed.
    pub fn previewed(errors: Vec<ImportError>, rows: Vec<ImportRow>) -> Self {
        Self {
            success: errors.is_empty(),
            created: 0,
            updated: 0,
            errors,
            preview: Some(rows),
        }
    }

    /// Commit refused because validation or resolution found problems.
    pub fn rejected(errors: Vec<ImportError>) -> Self {
        Self {
            success: errors.is_empty(),
            created: 0,
            updated: 0,
            errors,
            preview: None,
        }
    }

    pub fn committed(created: u32, updated: u32) -> Self {
        Self {
            success: true,
            created,
            updated,
            errors: Vec::new(),
            preview: None,
        }
    }

    /// File-level failure (unparseable input or rolled back commit).
    pub fn failed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::rejected(vec![ImportError::new(0, field, message)])
    }
}

/// A validated and resolved line, typed by entity kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ImportRow {
    Client(ClientRow),
    Contrat(ContratRow),
    Intervention(InterventionRow),
    Employe(EmployeRow),
}

impl ImportRow {
    /// Key used to decide between creating and updating the stored entity.
    pub fn natural_key(&self) -> NaturalKey {
        match self {
            Self::Client(row) => NaturalKey::Client {
                nom_entreprise: row.nom_entreprise.clone(),
            },
            Self::Contrat(row) => NaturalKey::Contrat {
                reference: row.reference.clone(),
            },
            Self::Intervention(row) => NaturalKey::Intervention {
                client_id: row.client_id,
                type_intervention: row.type_intervention,
                date_prevue: row.date_prevue,
                heure_prevue: row.heure_prevue,
            },
            Self::Employe(row) => NaturalKey::Employe {
                nom: row.nom.clone(),
                prenom: row.prenom.clone(),
            },
        }
    }
}

/// Human-meaningful identity of a record. Text parts compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NaturalKey {
    Client {
        nom_entreprise: String,
    },
    Contrat {
        reference: String,
    },
    Intervention {
        client_id: Uuid,
        type_intervention: InterventionType,
        date_prevue: NaiveDate,
        heure_prevue: Option<NaiveTime>,
    },
    Employe {
        nom: String,
        prenom: String,
    },
}

impl NaturalKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Client { .. } => EntityKind::Clients,
            Self::Contrat { .. } => EntityKind::Contrats,
            Self::Intervention { .. } => EntityKind::Interventions,
            Self::Employe { .. } => EntityKind::Employes,
        }
    }

    /// Case-folded form; two keys denote the same record iff these are equal.
    pub fn normalized(&self) -> String {
        match self {
            Self::Client { nom_entreprise } => nom_entreprise.trim().to_lowercase(),
            Self::Contrat { reference } => reference.trim().to_lowercase(),
            Self::Intervention {
                client_id,
                type_intervention,
                date_prevue,
                heure_prevue,
            } => format!(
                "{}|{}|{}|{}",
                client_id,
                type_intervention,
                date_prevue,
                heure_prevue.map(|t| t.to_string()).unwrap_or_default()
            ),
            Self::Employe { nom, prenom } => {
                format!("{}|{}", nom.trim().to_lowercase(), prenom.trim().to_lowercase())
            }
        }
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client { nom_entreprise } => write!(f, "{}", nom_entreprise),
            Self::Contrat { reference } => write!(f, "{}", reference),
            Self::Intervention {
                type_intervention,
                date_prevue,
                heure_prevue,
                ..
            } => match heure_prevue {
                Some(heure) => write!(f, "{} {} {}", type_intervention, date_prevue, heure.format("%H:%M")),
                None => write!(f, "{} {}", type_intervention, date_prevue),
            },
            Self::Employe { nom, prenom } => write!(f, "{} {}", prenom, nom),
        }
    }
}
