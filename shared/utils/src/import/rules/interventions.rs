use fieldops_models::{
    EntityKind, ImportError, ImportRow, InterventionRow, InterventionStatut, InterventionType,
};

use crate::error::FieldOpsResult;
use crate::import::resolver::Resolver;
use crate::import::schema::{Coercion, EntitySchema, FieldRule, FieldValues};
use crate::import::store::ReferenceLookup;

const FIELDS: &[FieldRule] = &[
    FieldRule::required("client", Coercion::Text { max_len: 255 }),
    FieldRule::optional("contrat", Coercion::Text { max_len: 100 }),
    FieldRule::required("type_intervention", Coercion::Enum(InterventionType::VALUES)),
    FieldRule::required("date_prevue", Coercion::Date),
    FieldRule::optional("heure_prevue", Coercion::Time),
    FieldRule::optional("duree_minutes", Coercion::Integer { min: 1, max: 1440 }),
    FieldRule::optional("statut", Coercion::Enum(InterventionStatut::VALUES)),
    FieldRule::optional("description", Coercion::Text { max_len: 2000 }),
];

pub(super) static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Interventions,
    key_column: "date_prevue",
    fields: FIELDS,
};

pub(super) async fn build<L: ReferenceLookup + ?Sized>(
    number: usize,
    values: &FieldValues,
    resolver: &mut Resolver<'_, L>,
    errors: &mut Vec<ImportError>,
) -> FieldOpsResult<Option<ImportRow>> {
    let client_nom = values.text("client");
    let client_id = match &client_nom {
        Some(name) => resolver.client(number, "client", name, errors).await?,
        None => None,
    };

    let contrat_reference = values.text("contrat");
    let contrat_id = match &contrat_reference {
        Some(reference) => {
            match resolver.contrat(number, "contrat", reference, client_id, errors).await? {
                Some(id) => Some(id),
                None => return Ok(None),
            }
        }
        None => None,
    };

    let (Some(client_nom), Some(client_id), Some(type_intervention), Some(date_prevue)) = (
        client_nom,
        client_id,
        values.parsed::<InterventionType>("type_intervention"),
        values.date("date_prevue"),
    ) else {
        return Ok(None);
    };

    Ok(Some(ImportRow::Intervention(InterventionRow {
        client_nom,
        client_id,
        contrat_reference,
        contrat_id,
        type_intervention,
        date_prevue,
        heure_prevue: values.time("heure_prevue"),
        // bounded to 1..=1440 by the column rule
        duree_minutes: values.integer("duree_minutes").map(|m| m as i32),
        statut: values.parsed("statut").unwrap_or_default(),
        description: values.text("description"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parser::ParsedRow;
    use crate::import::store::ContratRef;
    use async_trait::async_trait;
    use chrono::NaiveTime;
    use uuid::Uuid;

    struct Fixture {
        acme: Uuid,
        globex: Uuid,
        contrat: Uuid,
    }

    #[async_trait]
    impl ReferenceLookup for Fixture {
        async fn find_clients_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
            Ok(match name {
                "Acme" => vec![self.acme],
                "Globex" => vec![self.globex],
                _ => Vec::new(),
            })
        }

        async fn find_contrats_by_reference(&self, reference: &str) -> FieldOpsResult<Vec<ContratRef>> {
            Ok(if reference == "CT-ACME" {
                vec![ContratRef {
                    id: self.contrat,
                    client_id: self.acme,
                }]
            } else {
                Vec::new()
            })
        }

        async fn find_postes_by_name(&self, _: &str) -> FieldOpsResult<Vec<Uuid>> {
            Ok(Vec::new())
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            acme: Uuid::new_v4(),
            globex: Uuid::new_v4(),
            contrat: Uuid::new_v4(),
        }
    }

    fn parsed(pairs: &[(&str, &str)]) -> ParsedRow {
        ParsedRow {
            number: 5,
            values: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[tokio::test]
    async fn test_intervention_under_contract() {
        let lookup = fixture();
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        let values = SCHEMA.validate_row(
            &parsed(&[
                ("client", "Acme"),
                ("contrat", "CT-ACME"),
                ("type_intervention", "Préventive"),
                ("date_prevue", "2024-03-15"),
                ("heure_prevue", "08:30"),
                ("duree_minutes", "90"),
            ]),
            &mut errors,
        );
        let row = build(5, &values, &mut resolver, &mut errors).await.unwrap();

        // accented spelling is not in the vocabulary
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "type_intervention");
        assert!(row.is_none());

        errors.clear();
        let values = SCHEMA.validate_row(
            &parsed(&[
                ("client", "Acme"),
                ("contrat", "CT-ACME"),
                ("type_intervention", "Preventive"),
                ("date_prevue", "2024-03-15"),
                ("heure_prevue", "08:30"),
                ("duree_minutes", "90"),
            ]),
            &mut errors,
        );
        let Some(ImportRow::Intervention(row)) = build(5, &values, &mut resolver, &mut errors).await.unwrap() else {
            panic!("expected an intervention row");
        };
        assert!(errors.is_empty());
        assert_eq!(row.contrat_id, Some(lookup.contrat));
        assert_eq!(row.heure_prevue, NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(row.duree_minutes, Some(90));
        assert_eq!(row.statut, InterventionStatut::Planifiee);
    }

    #[tokio::test]
    async fn test_contract_of_another_client() {
        let lookup = fixture();
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        let values = SCHEMA.validate_row(
            &parsed(&[
                ("client", "Globex"),
                ("contrat", "CT-ACME"),
                ("type_intervention", "corrective"),
                ("date_prevue", "15/03/2024"),
            ]),
            &mut errors,
        );
        let row = build(5, &values, &mut resolver, &mut errors).await.unwrap();

        assert!(row.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "contrat");
        assert_eq!(errors[0].value.as_deref(), Some("CT-ACME"));
    }
}
