//! Tabular Exporter
//!
//! Writes stored entities back out as CSV in import template order, so an
//! export can be edited and fed straight back to preview.

use chrono::{NaiveDate, NaiveTime, Timelike};
use fieldops_models::{Client, Contrat, Employe, EntityKind, Intervention};

use super::rules::schema_for;
use super::schema::LIST_DELIMITER;
use super::store::ExportSource;
use crate::error::{FieldOpsError, FieldOpsResult};

/// A homogeneous batch of entities to export.
#[derive(Debug, Clone)]
pub enum ExportCollection {
    Clients(Vec<Client>),
    Contrats(Vec<Contrat>),
    Interventions(Vec<Intervention>),
    Employes(Vec<Employe>),
}

impl ExportCollection {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Clients(_) => EntityKind::Clients,
            Self::Contrats(_) => EntityKind::Contrats,
            Self::Interventions(_) => EntityKind::Interventions,
            Self::Employes(_) => EntityKind::Employes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Clients(items) => items.len(),
            Self::Contrats(items) => items.len(),
            Self::Interventions(items) => items.len(),
            Self::Employes(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> Vec<Cells> {
        match self {
            Self::Clients(items) => items.iter().map(client_cells).collect(),
            Self::Contrats(items) => items.iter().map(contrat_cells).collect(),
            Self::Interventions(items) => items.iter().map(intervention_cells).collect(),
            Self::Employes(items) => items.iter().map(employe_cells).collect(),
        }
    }
}

type Cells = Vec<(&'static str, String)>;

pub fn export(collection: &ExportCollection) -> FieldOpsResult<String> {
    let schema = schema_for(collection.kind());
    let columns: Vec<&str> = schema.columns().collect();

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for cells in collection.records() {
        let record = columns.iter().map(|column| {
            cells
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.as_str())
                .unwrap_or_default()
        });
        writer.write_record(record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| FieldOpsError::internal(format!("failed to flush CSV output: {}", err)))?;
    String::from_utf8(bytes).map_err(|err| FieldOpsError::internal(err.to_string()))
}

/// Load every entity of `kind` from `source` and export it.
pub async fn export_from<E: ExportSource + ?Sized>(source: &E, kind: EntityKind) -> FieldOpsResult<String> {
    let collection = match kind {
        EntityKind::Clients => ExportCollection::Clients(source.list_clients().await?),
        EntityKind::Contrats => ExportCollection::Contrats(source.list_contrats().await?),
        EntityKind::Interventions => ExportCollection::Interventions(source.list_interventions().await?),
        EntityKind::Employes => ExportCollection::Employes(source.list_employes().await?),
    };

    tracing::debug!(kind = %kind, records = collection.len(), "Exporting records");
    export(&collection)
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn list(items: &[String]) -> String {
    let mut delimiter = [0u8; 4];
    items.join(LIST_DELIMITER.encode_utf8(&mut delimiter))
}

fn date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn time(value: NaiveTime) -> String {
    if value.second() == 0 {
        value.format("%H:%M").to_string()
    } else {
        value.format("%H:%M:%S").to_string()
    }
}

fn boolean(value: bool) -> String {
    let text = if value { "oui" } else { "non" };
    text.to_string()
}

fn client_cells(client: &Client) -> Cells {
    vec![
        ("nom_entreprise", client.nom_entreprise.clone()),
        ("siege_nom", opt(&client.siege_nom)),
        ("siege_adresse", opt(&client.siege_adresse)),
        ("siege_code_postal", opt(&client.siege_code_postal)),
        ("siege_ville", opt(&client.siege_ville)),
        ("sites", list(&client.sites)),
        ("contact_nom", opt(&client.contact_nom)),
        ("contact_email", opt(&client.contact_email)),
        ("contact_telephone", opt(&client.contact_telephone)),
        ("notes", opt(&client.notes)),
    ]
}

fn contrat_cells(contrat: &Contrat) -> Cells {
    vec![
        ("reference", contrat.reference.clone()),
        ("client", contrat.client_nom.clone()),
        ("type_contrat", contrat.type_contrat.to_string()),
        ("date_debut", date(contrat.date_debut)),
        ("date_fin", contrat.date_fin.map(date).unwrap_or_default()),
        ("frequence", contrat.frequence.to_string()),
        ("statut", contrat.statut.to_string()),
        ("prestations", list(&contrat.prestations)),
        ("montant_ht", contrat.montant_ht.map(|m| m.to_string()).unwrap_or_default()),
        ("reconduction_tacite", boolean(contrat.reconduction_tacite)),
    ]
}

fn intervention_cells(intervention: &Intervention) -> Cells {
    vec![
        ("client", intervention.client_nom.clone()),
        ("contrat", opt(&intervention.contrat_reference)),
        ("type_intervention", intervention.type_intervention.to_string()),
        ("date_prevue", date(intervention.date_prevue)),
        ("heure_prevue", intervention.heure_prevue.map(time).unwrap_or_default()),
        (
            "duree_minutes",
            intervention.duree_minutes.map(|m| m.to_string()).unwrap_or_default(),
        ),
        ("statut", intervention.statut.to_string()),
        ("description", opt(&intervention.description)),
    ]
}

fn employe_cells(employe: &Employe) -> Cells {
    vec![
        ("nom", employe.nom.clone()),
        ("prenom", employe.prenom.clone()),
        ("email", opt(&employe.email)),
        ("telephone", opt(&employe.telephone)),
        ("postes", list(&employe.postes)),
        ("actif", boolean(employe.actif)),
    ]
}
