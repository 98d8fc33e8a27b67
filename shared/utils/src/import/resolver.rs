//! Reference Resolver
//!
//! Maps the human-readable references of an import row to identifiers.
//! Zero or several matches is always an error on the row, never a default.
//! Lookups go through a [`LookupCache`] owned by the resolver, so a file that
//! names the same client a thousand times hits storage once per invocation.

use std::collections::HashMap;

use fieldops_models::ImportError;
use uuid::Uuid;

use super::store::{ContratRef, ReferenceLookup};
use crate::error::FieldOpsResult;

/// Memoized lookup results, keyed by reference kind and case-folded key.
/// Lives exactly as long as one pipeline invocation.
#[derive(Debug, Default)]
pub struct LookupCache {
    clients: HashMap<String, Vec<Uuid>>,
    contrats: HashMap<String, Vec<ContratRef>>,
    postes: HashMap<String, Vec<Uuid>>,
}

impl LookupCache {
    pub fn len(&self) -> usize {
        self.clients.len() + self.contrats.len() + self.postes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cache_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub struct Resolver<'a, L: ReferenceLookup + ?Sized> {
    lookup: &'a L,
    cache: LookupCache,
}

impl<'a, L: ReferenceLookup + ?Sized> Resolver<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            cache: LookupCache::default(),
        }
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Client name to client id.
    pub async fn client(
        &mut self,
        row: usize,
        field: &str,
        name: &str,
        errors: &mut Vec<ImportError>,
    ) -> FieldOpsResult<Option<Uuid>> {
        let key = cache_key(name);
        if !self.cache.clients.contains_key(&key) {
            let found = self.lookup.find_clients_by_name(name.trim()).await?;
            self.cache.clients.insert(key.clone(), found);
        }
        let matches = self.cache.clients.get(&key).map(Vec::as_slice).unwrap_or_default();

        Ok(single_match(matches, row, field, name, "client", errors).copied())
    }

    /// Contract reference to contract id. When the row's client is known the
    /// contract must belong to it.
    pub async fn contrat(
        &mut self,
        row: usize,
        field: &str,
        reference: &str,
        client_id: Option<Uuid>,
        errors: &mut Vec<ImportError>,
    ) -> FieldOpsResult<Option<Uuid>> {
        let key = cache_key(reference);
        if !self.cache.contrats.contains_key(&key) {
            let found = self.lookup.find_contrats_by_reference(reference.trim()).await?;
            self.cache.contrats.insert(key.clone(), found);
        }
        let matches = self.cache.contrats.get(&key).map(Vec::as_slice).unwrap_or_default();

        let Some(contrat) = single_match(matches, row, field, reference, "contract", errors) else {
            return Ok(None);
        };

        match client_id {
            Some(client_id) if client_id != contrat.client_id => {
                errors.push(
                    ImportError::new(
                        row,
                        field,
                        format!("contract '{}' belongs to another client", reference),
                    )
                    .with_value(reference),
                );
                Ok(None)
            }
            _ => Ok(Some(contrat.id)),
        }
    }

    /// Post names to post ids. Unknown or ambiguous names are reported
    /// together as a single error on the field.
    pub async fn postes(
        &mut self,
        row: usize,
        field: &str,
        names: &[String],
        errors: &mut Vec<ImportError>,
    ) -> FieldOpsResult<Option<Vec<Uuid>>> {
        let mut ids = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        let mut ambiguous = Vec::new();

        for name in names {
            let key = cache_key(name);
            if !self.cache.postes.contains_key(&key) {
                let found = self.lookup.find_postes_by_name(name).await?;
                self.cache.postes.insert(key.clone(), found);
            }
            match self.cache.postes.get(&key).map(Vec::as_slice).unwrap_or_default() {
                [id] => ids.push(*id),
                [] => unknown.push(name.as_str()),
                _ => ambiguous.push(name.as_str()),
            }
        }

        if unknown.is_empty() && ambiguous.is_empty() {
            return Ok(Some(ids));
        }

        let mut reasons = Vec::new();
        if !unknown.is_empty() {
            reasons.push(format!("unknown post(s): {}", unknown.join(", ")));
        }
        if !ambiguous.is_empty() {
            reasons.push(format!("ambiguous post(s): {}", ambiguous.join(", ")));
        }
        errors.push(ImportError::new(row, field, reasons.join("; ")).with_value(names.join(", ")));
        Ok(None)
    }
}

fn single_match<'m, T>(
    matches: &'m [T],
    row: usize,
    field: &str,
    value: &str,
    label: &str,
    errors: &mut Vec<ImportError>,
) -> Option<&'m T> {
    match matches {
        [only] => Some(only),
        [] => {
            errors.push(
                ImportError::new(row, field, format!("no {} matches '{}'", label, value)).with_value(value),
            );
            None
        }
        _ => {
            errors.push(
                ImportError::new(
                    row,
                    field,
                    format!("'{}' is ambiguous: {} {}s match", value, matches.len(), label),
                )
                .with_value(value),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLookup {
        acme: Uuid,
        contrat: ContratRef,
        technicien: Uuid,
        calls: AtomicUsize,
    }

    impl FixedLookup {
        fn new() -> Self {
            let acme = Uuid::new_v4();
            Self {
                acme,
                contrat: ContratRef {
                    id: Uuid::new_v4(),
                    client_id: acme,
                },
                technicien: Uuid::new_v4(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReferenceLookup for FixedLookup {
        async fn find_clients_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match name.to_lowercase().as_str() {
                "acme" => vec![self.acme],
                "twin" => vec![Uuid::new_v4(), Uuid::new_v4()],
                _ => Vec::new(),
            })
        }

        async fn find_contrats_by_reference(&self, reference: &str) -> FieldOpsResult<Vec<ContratRef>> {
            Ok(if reference.eq_ignore_ascii_case("ct-001") {
                vec![self.contrat]
            } else {
                Vec::new()
            })
        }

        async fn find_postes_by_name(&self, name: &str) -> FieldOpsResult<Vec<Uuid>> {
            Ok(if name.eq_ignore_ascii_case("technicien") {
                vec![self.technicien]
            } else {
                Vec::new()
            })
        }
    }

    #[tokio::test]
    async fn test_client_resolution_is_cached() {
        let lookup = FixedLookup::new();
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        for row in 1..=3 {
            let id = resolver.client(row, "client", "ACME", &mut errors).await.unwrap();
            assert_eq!(id, Some(lookup.acme));
        }
        assert!(errors.is_empty());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_ambiguous_clients_are_errors() {
        let lookup = FixedLookup::new();
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        assert_eq!(resolver.client(1, "client", "Nobody", &mut errors).await.unwrap(), None);
        assert_eq!(resolver.client(2, "client", "Twin", &mut errors).await.unwrap(), None);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "no client matches 'Nobody'");
        assert!(errors[1].message.contains("ambiguous"));
        assert_eq!(errors[1].value.as_deref(), Some("Twin"));
    }

    #[tokio::test]
    async fn test_contrat_must_belong_to_client() {
        let lookup = FixedLookup::new();
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        let ok = resolver
            .contrat(1, "contrat", "ct-001", Some(lookup.acme), &mut errors)
            .await
            .unwrap();
        assert_eq!(ok, Some(lookup.contrat.id));

        let other = resolver
            .contrat(2, "contrat", "CT-001", Some(Uuid::new_v4()), &mut errors)
            .await
            .unwrap();
        assert_eq!(other, None);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("another client"));
    }

    #[tokio::test]
    async fn test_unknown_postes_are_reported_once() {
        let lookup = FixedLookup::new();
        let mut resolver = Resolver::new(&lookup);
        let mut errors = Vec::new();

        let names = vec!["Technicien".to_string(), "Astronaute".to_string(), "Pilote".to_string()];
        let ids = resolver.postes(4, "postes", &names, &mut errors).await.unwrap();

        assert_eq!(ids, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 4);
        assert_eq!(errors[0].message, "unknown post(s): Astronaute, Pilote");
    }
}
