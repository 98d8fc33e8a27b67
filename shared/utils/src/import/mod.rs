//! Bulk CSV import and export.
//!
//! [`TabularParser`] reads the text, [`EntitySchema`] tables coerce and check
//! each row, [`Resolver`] turns names into ids, and [`ImportEngine`] drives
//! preview and commit over any [`ImportStore`]. [`export`] writes stored
//! entities back out in the same column layout.

pub mod engine;
pub mod exporter;
pub mod memory;
pub mod parser;
pub mod resolver;
pub mod rules;
pub mod schema;
pub mod store;

pub use engine::{failure_result, CommitState, ImportEngine};
pub use exporter::{export, export_from, ExportCollection};
pub use memory::{MemoryAuditSink, MemoryStore, MemoryTransaction};
pub use parser::{ParsedRow, ParsedTable, TabularParser};
pub use resolver::{LookupCache, Resolver};
pub use rules::{schema_for, template};
pub use schema::{Coercion, EntitySchema, FieldRule, FieldValue, FieldValues};
pub use store::{
    AuditSink, ContratRef, ExportSource, ImportStore, ImportTransaction, ReferenceLookup,
    StoredRecord,
};
