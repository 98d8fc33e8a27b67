//! Repository module for database CRUD operations
//!
//! Each repository owns pool-level reads for one entity. The `pub(crate)`
//! functions beside them take a bare connection so the import store can run
//! them inside its transaction.

pub mod client;
pub mod contrat;
pub mod intervention;
pub mod employe;
pub mod audit;

pub use client::ClientRepository;
pub use contrat::ContratRepository;
pub use intervention::InterventionRepository;
pub use employe::{EmployeRepository, PosteRepository};
pub use audit::AuditRepository;

use std::str::FromStr;

/// Parse a vocabulary column, surfacing unknown values as decode errors.
pub(crate) fn decode<T>(value: &str) -> sqlx::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldops_models::{ContratStatut, InterventionStatut};

    #[test]
    fn test_decode_vocabulary_columns() {
        assert_eq!(decode::<ContratStatut>("actif").unwrap(), ContratStatut::Actif);
        assert_eq!(decode::<InterventionStatut>("en_cours").unwrap(), InterventionStatut::EnCours);
        assert!(matches!(decode::<ContratStatut>("archive"), Err(sqlx::Error::Decode(_))));
    }
}
