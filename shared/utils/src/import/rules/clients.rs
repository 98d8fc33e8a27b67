use fieldops_models::{ClientRow, EntityKind, ImportRow};

use super::{email, phone, postal_code};
use crate::import::schema::{Coercion, EntitySchema, FieldRule, FieldValues};

const FIELDS: &[FieldRule] = &[
    FieldRule::required("nom_entreprise", Coercion::Text { max_len: 255 }),
    FieldRule::optional("siege_nom", Coercion::Text { max_len: 255 }),
    FieldRule::optional("siege_adresse", Coercion::Text { max_len: 500 }),
    FieldRule::optional("siege_code_postal", Coercion::Text { max_len: 10 }).with_check(postal_code),
    FieldRule::optional("siege_ville", Coercion::Text { max_len: 255 }),
    FieldRule::optional("sites", Coercion::List),
    FieldRule::optional("contact_nom", Coercion::Text { max_len: 255 }),
    FieldRule::optional("contact_email", Coercion::Text { max_len: 255 }).with_check(email),
    FieldRule::optional("contact_telephone", Coercion::Text { max_len: 30 }).with_check(phone),
    FieldRule::optional("notes", Coercion::Text { max_len: 2000 }),
];

pub(super) static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Clients,
    key_column: "nom_entreprise",
    fields: FIELDS,
};

/// Clients reference nothing, so building never resolves.
pub(super) fn build(values: &FieldValues) -> Option<ImportRow> {
    Some(ImportRow::Client(ClientRow {
        nom_entreprise: values.text("nom_entreprise")?,
        siege_nom: values.text("siege_nom"),
        siege_adresse: values.text("siege_adresse"),
        siege_code_postal: values.text("siege_code_postal"),
        siege_ville: values.text("siege_ville"),
        sites: values.list("sites"),
        contact_nom: values.text("contact_nom"),
        contact_email: values.text("contact_email"),
        contact_telephone: values.text("contact_telephone"),
        notes: values.text("notes"),
    }))
}
