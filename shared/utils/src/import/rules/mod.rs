//! Per-entity import templates.
//!
//! Each submodule declares the column table of one entity kind and the step
//! that turns coerced values into a resolved [`ImportRow`].

mod clients;
mod contrats;
mod employes;
mod interventions;

use fieldops_models::{EntityKind, ImportError, ImportRow};

use super::resolver::Resolver;
use super::schema::{check_text, EntitySchema, FieldValue, FieldValues};
use super::store::ReferenceLookup;
use crate::error::FieldOpsResult;
use crate::validation::{validate_email_address, validate_phone_number, validate_postal_code};

pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Clients => &clients::SCHEMA,
        EntityKind::Contrats => &contrats::SCHEMA,
        EntityKind::Interventions => &interventions::SCHEMA,
        EntityKind::Employes => &employes::SCHEMA,
    }
}

/// Header-only CSV users fill in before importing.
pub fn template(kind: EntityKind) -> String {
    schema_for(kind).template()
}

/// Resolve references and assemble the typed row.
///
/// Returns `None` when a required part could not be produced; the reason is
/// always already in `errors`.
pub async fn build_row<L: ReferenceLookup + ?Sized>(
    kind: EntityKind,
    number: usize,
    values: &FieldValues,
    resolver: &mut Resolver<'_, L>,
    errors: &mut Vec<ImportError>,
) -> FieldOpsResult<Option<ImportRow>> {
    match kind {
        EntityKind::Clients => Ok(clients::build(values)),
        EntityKind::Contrats => contrats::build(number, values, resolver, errors).await,
        EntityKind::Interventions => interventions::build(number, values, resolver, errors).await,
        EntityKind::Employes => employes::build(number, values, resolver, errors).await,
    }
}

fn email(value: &FieldValue) -> Result<(), String> {
    check_text(value, validate_email_address)
}

fn phone(value: &FieldValue) -> Result<(), String> {
    check_text(value, validate_phone_number)
}

fn postal_code(value: &FieldValue) -> Result<(), String> {
    check_text(value, validate_postal_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        assert_eq!(
            template(EntityKind::Clients),
            "nom_entreprise,siege_nom,siege_adresse,siege_code_postal,siege_ville,sites,contact_nom,contact_email,contact_telephone,notes\n"
        );
        assert_eq!(
            template(EntityKind::Employes),
            "nom,prenom,email,telephone,postes,actif\n"
        );
        assert!(template(EntityKind::Contrats).starts_with("reference,client,type_contrat,"));
        assert!(template(EntityKind::Interventions).starts_with("client,contrat,type_intervention,"));
    }

    #[test]
    fn test_key_column_belongs_to_schema() {
        for kind in EntityKind::ALL {
            let schema = schema_for(kind);
            assert_eq!(schema.kind, kind);
            assert!(schema.columns().any(|c| c == schema.key_column));
        }
    }
}
