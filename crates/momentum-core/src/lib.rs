//! # momentum-core
//!
//! The release catalog engine for Momentum - THE LOGIC.
//!
//! This crate records projects, their versioned releases and the downloadable
//! builds of each release, and answers the read paths a download site needs:
//! project listings, the latest release per tier and download redirects.
//!
//! ## Layout
//!
//! - `storage` → typed redb tables, unique and ordered indexes, transaction scopes
//! - `query` → read paths, bounded per-parent fan-out, tier resolution
//! - `mutation` → write paths with validation and uniqueness checks
//! - `projection` → status-dependent payload shapes
//! - `catalog` → one transaction per call over the engines above
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Every operation runs inside exactly one transaction scope
//! - A rejected mutation commits nothing

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod mutation;
pub mod primitives;
pub mod projection;
pub mod query;
pub mod storage;
pub mod types;
pub mod version;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Build, BuildId, CatalogError, ErrorKind, Missing, NewBuild, NewProject, NewRelease, Project,
    ProjectId, ProjectView, Release, ReleaseId, ReleaseStatus, ReleaseView,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use catalog::Catalog;
pub use mutation::MutationEngine;
pub use projection::{BuildPayload, ProjectPayload, ReleasePayload};
pub use query::QueryEngine;
pub use storage::{CatalogDb, CatalogRead, ReadScope, WriteScope};
pub use version::{Version, compare_versions};
