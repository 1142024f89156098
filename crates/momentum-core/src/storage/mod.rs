//! # Storage
//!
//! The entity store: projects, releases and builds kept in redb tables, with
//! unique and ordered indexes maintained in the same transaction as the rows
//! they point at.

mod redb_catalog;

pub use redb_catalog::{CatalogDb, CatalogRead, ReadScope, WriteScope};
