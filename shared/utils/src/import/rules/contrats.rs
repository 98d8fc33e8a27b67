use fieldops_models::{
    ContratRow, ContratStatut, ContratType, EntityKind, Frequence, ImportError, ImportRow,
};

use crate::error::FieldOpsResult;
use crate::import::resolver::Resolver;
use crate::import::schema::{Coercion, EntitySchema, FieldRule, FieldValues};
use crate::import::store::ReferenceLookup;
use crate::validation::validate_date_range;

const FIELDS: &[FieldRule] = &[
    FieldRule::required("reference", Coercion::Text { max_len: 100 }),
    FieldRule::required("client", Coercion::Text { max_len: 255 }),
    FieldRule::required("type_contrat", Coercion::Enum(ContratType::VALUES)),
    FieldRule::required("date_debut", Coercion::Date),
    FieldRule::optional("date_fin", Coercion::Date),
    FieldRule::required("frequence", Coercion::Enum(Frequence::VALUES)),
    FieldRule::optional("statut", Coercion::Enum(ContratStatut::VALUES)),
    FieldRule::optional("prestations", Coercion::List),
    FieldRule::optional("montant_ht", Coercion::Decimal { min: 0.0 }),
    FieldRule::optional("reconduction_tacite", Coercion::Boolean),
];

pub(super) static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Contrats,
    key_column: "reference",
    fields: FIELDS,
};

pub(super) async fn build<L: ReferenceLookup + ?Sized>(
    number: usize,
    values: &FieldValues,
    resolver: &mut Resolver<'_, L>,
    errors: &mut Vec<ImportError>,
) -> FieldOpsResult<Option<ImportRow>> {
    let client_id = match values.text("client") {
        Some(name) => resolver.client(number, "client", &name, errors).await?,
        None => None,
    };

    let date_debut = values.date("date_debut");
    let date_fin = values.date("date_fin");
    if let (Some(debut), Some(fin)) = (date_debut, date_fin) {
        if let Err(err) = validate_date_range(debut, fin) {
            errors.push(
                ImportError::new(number, "date_fin", err.into_message())
                    .with_value(fin.format("%Y-%m-%d").to_string()),
            );
        }
    }

    let (Some(reference), Some(client_nom), Some(client_id), Some(type_contrat), Some(date_debut), Some(frequence)) = (
        values.text("reference"),
        values.text("client"),
        client_id,
        values.parsed::<ContratType>("type_contrat"),
        date_debut,
        values.parsed::<Frequence>("frequence"),
    ) else {
        return Ok(None);
    };

    Ok(Some(ImportRow::Contrat(ContratRow {
        reference,
        client_nom,
        client_id,
        type_contrat,
        date_debut,
        date_fin,
        frequence,
        statut: values.parsed("statut").unwrap_or_default(),
        prestations: values.list("prestations"),
        montant_ht: values.decimal("montant_ht"),
        reconduction_tacite: values.boolean("reconduction_tacite").unwrap_or(false),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parser::ParsedRow;
    use crate::import::store::ContratRef;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct OneClient(Uuid);

    #[async_trait]
    impl ReferenceLookup for OneClient {
        async fn find_clients_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
            Ok(if name == "Acme" { vec![self.0] } else { Vec::new() })
        }

        async fn find_contrats_by_reference(&self, _: &str) -> FieldOpsResult<Vec<ContratRef>> {
            Ok(Vec::new())
        }

        async fn find_postes_by_name(&self, _: &str) -> FieldOpsResult<Vec<Uuid>> {
            Ok(Vec::new())
        }
    }

    fn parsed(pairs: &[(&str, &str)]) -> ParsedRow {
        ParsedRow {
            number: 2,
            values: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[tokio::test]
    async fn test_defaults_and_resolution() {
        let lookup = OneClient(Uuid::new_v4());
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        let values = SCHEMA.validate_row(
            &parsed(&[
                ("reference", "CT-2024-001"),
                ("client", "Acme"),
                ("type_contrat", "Maintenance"),
                ("date_debut", "01/01/2024"),
                ("frequence", "Trimestrielle"),
                ("montant_ht", "1200,50"),
            ]),
            &mut errors,
        );
        let row = build(2, &values, &mut resolver, &mut errors).await.unwrap();

        assert!(errors.is_empty(), "{:?}", errors);
        let Some(ImportRow::Contrat(row)) = row else {
            panic!("expected a contract row");
        };
        assert_eq!(row.client_id, lookup.0);
        assert_eq!(row.statut, ContratStatut::Actif);
        assert_eq!(row.frequence, Frequence::Trimestrielle);
        assert_eq!(row.montant_ht, Some(1200.5));
        assert!(!row.reconduction_tacite);
    }

    #[tokio::test]
    async fn test_end_before_start_is_reported_on_date_fin() {
        let lookup = OneClient(Uuid::new_v4());
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        let values = SCHEMA.validate_row(
            &parsed(&[
                ("reference", "CT-1"),
                ("client", "Inconnu"),
                ("type_contrat", "entretien"),
                ("date_debut", "2024-06-01"),
                ("date_fin", "2024-01-01"),
                ("frequence", "annuelle"),
            ]),
            &mut errors,
        );
        let row = build(2, &values, &mut resolver, &mut errors).await.unwrap();

        assert!(row.is_none());
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["client", "date_fin"]);
        assert!(errors.iter().all(|e| e.row == 2));
    }
}
