use fieldops_models::{EmployeRow, EntityKind, ImportError, ImportRow};

use super::{email, phone};
use crate::error::FieldOpsResult;
use crate::import::resolver::Resolver;
use crate::import::schema::{Coercion, EntitySchema, FieldRule, FieldValues};
use crate::import::store::ReferenceLookup;

const FIELDS: &[FieldRule] = &[
    FieldRule::required("nom", Coercion::Text { max_len: 100 }),
    FieldRule::required("prenom", Coercion::Text { max_len: 100 }),
    FieldRule::optional("email", Coercion::Text { max_len: 255 }).with_check(email),
    FieldRule::optional("telephone", Coercion::Text { max_len: 30 }).with_check(phone),
    FieldRule::optional("postes", Coercion::List),
    FieldRule::optional("actif", Coercion::Boolean),
];

pub(super) static SCHEMA: EntitySchema = EntitySchema {
    kind: EntityKind::Employes,
    key_column: "nom",
    fields: FIELDS,
};

pub(super) async fn build<L: ReferenceLookup + ?Sized>(
    number: usize,
    values: &FieldValues,
    resolver: &mut Resolver<'_, L>,
    errors: &mut Vec<ImportError>,
) -> FieldOpsResult<Option<ImportRow>> {
    let postes = values.list("postes");
    let poste_ids = if postes.is_empty() {
        Vec::new()
    } else {
        match resolver.postes(number, "postes", &postes, errors).await? {
            Some(ids) => ids,
            None => return Ok(None),
        }
    };

    let (Some(nom), Some(prenom)) = (values.text("nom"), values.text("prenom")) else {
        return Ok(None);
    };

    Ok(Some(ImportRow::Employe(EmployeRow {
        nom,
        prenom,
        email: values.text("email"),
        telephone: values.text("telephone"),
        postes,
        poste_ids,
        actif: values.boolean("actif").unwrap_or(true),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parser::ParsedRow;
    use crate::import::store::ContratRef;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct Postes(Uuid);

    #[async_trait]
    impl ReferenceLookup for Postes {
        async fn find_clients_by_name(&self, _: &str) -> FieldOpsResult<Vec<Uuid>> {
            Ok(Vec::new())
        }

        async fn find_contrats_by_reference(&self, _: &str) -> FieldOpsResult<Vec<ContratRef>> {
            Ok(Vec::new())
        }

        async fn find_postes_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
            Ok(if name.eq_ignore_ascii_case("technicien") { vec![self.0] } else { Vec::new() })
        }
    }

    #[tokio::test]
    async fn test_employe_defaults_to_active() {
        let lookup = Postes(Uuid::new_v4());
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        let parsed = ParsedRow {
            number: 1,
            values: [("nom", "Durand"), ("prenom", "Léa"), ("postes", "technicien")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let values = SCHEMA.validate_row(&parsed, &mut errors);
        let Some(ImportRow::Employe(row)) = build(1, &values, &mut resolver, &mut errors).await.unwrap() else {
            panic!("expected an employee row");
        };

        assert!(errors.is_empty());
        assert!(row.actif);
        assert_eq!(row.poste_ids, vec![lookup.0]);
        assert_eq!(row.postes, vec!["technicien".to_string()]);
    }
}
