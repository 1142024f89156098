//! # Catalog
//!
//! The entry point of the engine. A `Catalog` owns the database and runs
//! each operation inside exactly one transaction scope, created and torn
//! down per call. Query results leave through the projection layer.
//!
//! ## Concurrency
//!
//! `Catalog` is `Send + Sync` and holds no per-request state. Readers work on
//! MVCC snapshots and never block writers; writers are serialized by the
//! store, and the unique indexes are checked inside the writer's transaction.

use crate::mutation::MutationEngine;
use crate::projection::{ProjectPayload, ReleasePayload};
use crate::query::QueryEngine;
use crate::storage::CatalogDb;
use crate::{Build, CatalogError, Project, Release, ReleaseStatus};
use std::path::Path;

/// A release catalog backed by one database.
#[derive(Debug)]
pub struct Catalog {
    db: CatalogDb,
}

impl Catalog {
    /// Open or create a persistent catalog at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Ok(Self::with_db(CatalogDb::open(path)?))
    }

    /// Create a volatile in-memory catalog.
    pub fn in_memory() -> Result<Self, CatalogError> {
        Ok(Self::with_db(CatalogDb::in_memory()?))
    }

    #[must_use]
    pub fn with_db(db: CatalogDb) -> Self {
        Self { db }
    }

    /// Direct store access, for maintainer tasks that sit outside the engine
    /// such as flagging recommended builds.
    #[must_use]
    pub fn db(&self) -> &CatalogDb {
        &self.db
    }

    /// Compact the underlying database file.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn compact(&mut self) -> Result<bool, CatalogError> {
        let reclaimed = self.db.compact()?;
        tracing::info!(reclaimed, "catalog compacted");
        Ok(reclaimed)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn list_projects(&self) -> Result<Vec<ProjectPayload>, CatalogError> {
        let scope = self.db.read()?;
        let views = QueryEngine::list_projects(&scope)?;
        Ok(views.iter().map(ProjectPayload::from).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn project(&self, slug: &str) -> Result<ProjectPayload, CatalogError> {
        let scope = self.db.read()?;
        Ok(ProjectPayload::from(&QueryEngine::project(&scope, slug)?))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn latest_releases(&self, slug: &str) -> Result<ProjectPayload, CatalogError> {
        let scope = self.db.read()?;
        Ok(ProjectPayload::from(&QueryEngine::latest_releases(
            &scope, slug,
        )?))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn latest_for_tier(
        &self,
        slug: &str,
        tier: &str,
    ) -> Result<Vec<ReleasePayload>, CatalogError> {
        let scope = self.db.read()?;
        let views = QueryEngine::latest_for_tier(&scope, slug, tier)?;
        Ok(views.iter().map(ReleasePayload::from).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn release(&self, slug: &str, version: &str) -> Result<ReleasePayload, CatalogError> {
        let scope = self.db.read()?;
        Ok(ReleasePayload::from(&QueryEngine::release_by_version(
            &scope, slug, version,
        )?))
    }

    /// Download URL of the newest build of the newest release in a tier.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn download_for_tier(&self, slug: &str, tier: &str) -> Result<String, CatalogError> {
        let scope = self.db.read()?;
        Ok(QueryEngine::download_for_tier(&scope, slug, tier)?.url)
    }

    /// Download URL of one exact build.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn download_for_build(
        &self,
        slug: &str,
        version: &str,
        build_id: u64,
    ) -> Result<String, CatalogError> {
        let scope = self.db.read()?;
        Ok(QueryEngine::download_for_build(&scope, slug, version, build_id)?.url)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn create_project(&self, name: &str, slug: &str) -> Result<Project, CatalogError> {
        let scope = self.db.write()?;
        let project = MutationEngine::create_project(&scope, name, slug)?;
        scope.commit()?;
        tracing::info!(slug, "project created");
        Ok(project)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn create_release(
        &self,
        slug: &str,
        version: &str,
        status: &str,
    ) -> Result<Release, CatalogError> {
        let scope = self.db.write()?;
        let release = MutationEngine::create_release(&scope, slug, version, status)?;
        scope.commit()?;
        tracing::info!(slug, version, status, "release created");
        Ok(release)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn edit_release(
        &self,
        slug: &str,
        version: &str,
        status: Option<&str>,
    ) -> Result<Release, CatalogError> {
        let scope = self.db.write()?;
        let release = MutationEngine::edit_release(&scope, slug, version, status)?;
        scope.commit()?;
        tracing::info!(slug, version, status = %release.status, "release edited");
        Ok(release)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn register_build(
        &self,
        slug: &str,
        version: &str,
        build_id: u64,
        url: &str,
    ) -> Result<(Build, ReleaseStatus), CatalogError> {
        let scope = self.db.write()?;
        let (build, owner) = MutationEngine::register_build(&scope, slug, version, build_id, url)?;
        scope.commit()?;
        tracing::info!(slug, version, build_id, "build registered");
        Ok((build, owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }

    #[test]
    fn queries_see_committed_mutations() {
        let catalog = Catalog::in_memory().expect("catalog");
        catalog.create_project("Demo", "demo").expect("project");
        catalog.create_release("demo", "1.0.0", "beta").expect("release");
        catalog
            .register_build("demo", "1.0.0", 3, "https://x/3")
            .expect("build");

        let release = catalog.release("demo", "1.0.0").expect("release");
        assert_eq!(release.builds.map(|b| b.len()), Some(1));
        assert_eq!(
            catalog.download_for_tier("demo", "beta").expect("download"),
            "https://x/3"
        );
    }

    #[test]
    fn register_build_reports_owner_status_from_same_write() {
        let catalog = Catalog::in_memory().expect("catalog");
        catalog.create_project("Demo", "demo").expect("project");
        catalog.create_release("demo", "2.0", "stable").expect("release");
        catalog.create_release("demo", "2.1", "development").expect("release");

        let (build, owner) = catalog
            .register_build("demo", "2.0", 5, "https://x/5")
            .expect("build");
        assert_eq!(build.specific_build_id, 5);
        assert_eq!(owner, ReleaseStatus::Stable);

        let (_, owner) = catalog
            .register_build("demo", "2.1", 1, "https://x/dev")
            .expect("build");
        assert_eq!(owner, ReleaseStatus::Development);
    }

    #[test]
    fn failed_mutation_is_not_committed() {
        let catalog = Catalog::in_memory().expect("catalog");
        catalog.create_project("Demo", "demo").expect("project");
        assert!(catalog.create_release("demo", "1.0", "golden").is_err());
        assert!(catalog.project("demo").expect("project").releases.is_empty());
    }
}
