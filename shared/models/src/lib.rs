//! # FieldOps Domain Models
//!
//! Domain models for the FieldOps operations platform: clients, contracts,
//! scheduled interventions and staff, plus the types exchanged by the bulk
//! CSV import/export engine.
//!
//! ## Key Models
//!
//! - **Client**: a company with a head-office site, extra sites and a contact
//! - **Contrat**: a service contract bound to a client
//! - **Intervention**: a scheduled field visit for a client, optionally under a contract
//! - **Employe**: a staff member holding posts from the controlled **Poste** vocabulary
//! - **ImportResult**: outcome of a bulk preview or commit, with per-row **ImportError**s
//!
//! Every `*Row` type is the validated, resolved form of one import line. Rows
//! serialize with camelCase keys and omit absent optional values.

pub mod vocabulary;
pub mod client;
pub mod contrat;
pub mod intervention;
pub mod employe;
pub mod import;
pub mod audit;


pub use vocabulary::{normalize_token, UnknownVariant};
pub use client::*;
pub use contrat::*;
pub use intervention::*;
pub use employe::*;
pub use import::*;
pub use audit::*;
