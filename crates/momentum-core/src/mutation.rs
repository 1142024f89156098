//! # Mutation Engine
//!
//! Write paths of the catalog: project creation, release creation, release
//! status edits and build registration.
//!
//! Every mutation runs its checks and writes inside one [`WriteScope`]. A
//! failed check returns before anything is committed, so a rejected call
//! leaves no partial state. The existence pre-checks here give friendlier
//! errors; the store's unique indexes reject duplicates regardless.

use crate::primitives::{
    MAX_NAME_LENGTH, MAX_SLUG_LENGTH, MAX_URL_LENGTH, MAX_VERSION_LENGTH, require_text,
};
use crate::storage::{CatalogRead, WriteScope};
use crate::version::Version;
use crate::{
    Build, CatalogError, Missing, NewBuild, NewProject, NewRelease, Project, Release,
    ReleaseStatus,
};

/// The MutationEngine groups the catalog write operations.
pub struct MutationEngine;

impl MutationEngine {
    /// Register a new project under a unique slug.
    pub fn create_project(
        scope: &WriteScope,
        name: &str,
        slug: &str,
    ) -> Result<Project, CatalogError> {
        require_text("Name", name, MAX_NAME_LENGTH)?;
        require_text("Slug", slug, MAX_SLUG_LENGTH)?;

        if scope.project_by_slug(slug)?.is_some() {
            return Err(CatalogError::AlreadyExists(format!("project {}", slug)));
        }
        scope.insert_project(NewProject {
            name: name.to_string(),
            slug: slug.to_string(),
        })
    }

    /// Create a release of a project with an initial status.
    ///
    /// The version must parse as a dot-separated numeric version and must not
    /// be registered anywhere in the catalog yet.
    pub fn create_release(
        scope: &WriteScope,
        slug: &str,
        version: &str,
        status: &str,
    ) -> Result<Release, CatalogError> {
        let status = Self::parse_status(status)?;
        require_text("Version", version, MAX_VERSION_LENGTH)?;
        Version::parse(version)?;

        let project = scope
            .project_by_slug(slug)?
            .ok_or_else(|| CatalogError::NotFound(Missing::Project(slug.to_string())))?;

        if scope.release_with_version(version)?.is_some() {
            return Err(CatalogError::AlreadyExists(format!("release {}", version)));
        }
        scope.insert_release(NewRelease::new(project.id, version, status))
    }

    /// Change the status of an existing release.
    ///
    /// Any status may follow any other. Without a new status the call changes
    /// nothing and still succeeds.
    pub fn edit_release(
        scope: &WriteScope,
        slug: &str,
        version: &str,
        new_status: Option<&str>,
    ) -> Result<Release, CatalogError> {
        let new_status = new_status.map(Self::parse_status).transpose()?;

        let project = scope
            .project_by_slug(slug)?
            .ok_or_else(|| CatalogError::NotFound(Missing::Project(slug.to_string())))?;
        let release = scope
            .release_by_version(project.id, version)?
            .ok_or_else(|| CatalogError::NotFound(Missing::Release(version.to_string())))?;

        match new_status {
            Some(status) if status != release.status => {
                scope.update_release_status(&release, status)
            }
            _ => Ok(release),
        }
    }

    /// Register a build of a release under a caller-chosen build id.
    ///
    /// Returns the build together with the status its release had in this
    /// transaction.
    pub fn register_build(
        scope: &WriteScope,
        slug: &str,
        version: &str,
        build_id: u64,
        url: &str,
    ) -> Result<(Build, ReleaseStatus), CatalogError> {
        require_text("Url", url, MAX_URL_LENGTH)?;

        let project = scope
            .project_by_slug(slug)?
            .ok_or_else(|| CatalogError::NotFound(Missing::Project(slug.to_string())))?;
        let release = scope
            .release_by_version(project.id, version)?
            .ok_or_else(|| CatalogError::NotFound(Missing::Release(version.to_string())))?;

        if scope.build(release.id, build_id)?.is_some() {
            return Err(CatalogError::AlreadyExists(format!("build {}", build_id)));
        }
        let build = scope.insert_build(NewBuild::new(release.id, build_id, url))?;
        Ok((build, release.status))
    }

    fn parse_status(status: &str) -> Result<ReleaseStatus, CatalogError> {
        ReleaseStatus::from_name(status)
            .ok_or_else(|| CatalogError::InvalidStatus(status.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogDb;

    fn catalog_with_project() -> CatalogDb {
        let db = CatalogDb::in_memory().expect("open db");
        let scope = db.write().expect("write");
        MutationEngine::create_project(&scope, "Demo", "demo").expect("project");
        scope.commit().expect("commit");
        db
    }

    #[test]
    fn create_project_validates_and_rejects_duplicates() {
        let db = CatalogDb::in_memory().expect("open db");
        let scope = db.write().expect("write");

        assert!(matches!(
            MutationEngine::create_project(&scope, "", "demo"),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            MutationEngine::create_project(&scope, "Demo", &"s".repeat(31)),
            Err(CatalogError::Validation(_))
        ));
        MutationEngine::create_project(&scope, "Demo", "demo").expect("first");
        assert!(matches!(
            MutationEngine::create_project(&scope, "Again", "demo"),
            Err(CatalogError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_release_defaults() {
        let db = catalog_with_project();
        let scope = db.write().expect("write");
        let release =
            MutationEngine::create_release(&scope, "demo", "1.0.0", "stable").expect("create");
        scope.commit().expect("commit");

        assert_eq!(release.status, ReleaseStatus::Stable);
        assert_eq!(release.released_at, None);
    }

    #[test]
    fn create_release_errors() {
        let db = catalog_with_project();
        let scope = db.write().expect("write");

        assert!(matches!(
            MutationEngine::create_release(&scope, "nope", "1.0", "stable"),
            Err(CatalogError::NotFound(Missing::Project(_)))
        ));
        assert!(matches!(
            MutationEngine::create_release(&scope, "demo", "1.0", "gold"),
            Err(CatalogError::InvalidStatus(_))
        ));
        assert!(matches!(
            MutationEngine::create_release(&scope, "demo", "1.x", "beta"),
            Err(CatalogError::InvalidVersion(_))
        ));
        assert!(matches!(
            MutationEngine::create_release(&scope, "demo", "", "beta"),
            Err(CatalogError::Validation(_))
        ));
        MutationEngine::create_release(&scope, "demo", "1.0", "beta").expect("first");
        assert!(matches!(
            MutationEngine::create_release(&scope, "demo", "1.0", "stable"),
            Err(CatalogError::AlreadyExists(_))
        ));
    }

    #[test]
    fn edit_release_any_direction_and_noop() {
        let db = catalog_with_project();
        let scope = db.write().expect("write");
        MutationEngine::create_release(&scope, "demo", "1.0", "stable").expect("create");

        let back = MutationEngine::edit_release(&scope, "demo", "1.0", Some("development"))
            .expect("edit");
        assert_eq!(back.status, ReleaseStatus::Development);

        let same = MutationEngine::edit_release(&scope, "demo", "1.0", None).expect("noop");
        assert_eq!(same.status, ReleaseStatus::Development);
        scope.commit().expect("commit");

        let read = db.read().expect("read");
        let project = read.project_by_slug("demo").expect("lookup").expect("present");
        assert_eq!(
            read.releases_in_tier(project.id, ReleaseStatus::Development, None)
                .expect("tier")
                .len(),
            1
        );
    }

    #[test]
    fn edit_release_errors() {
        let db = catalog_with_project();
        let scope = db.write().expect("write");
        MutationEngine::create_release(&scope, "demo", "1.0", "stable").expect("create");

        assert!(matches!(
            MutationEngine::edit_release(&scope, "demo", "1.0", Some("released")),
            Err(CatalogError::InvalidStatus(_))
        ));
        assert!(matches!(
            MutationEngine::edit_release(&scope, "nope", "1.0", None),
            Err(CatalogError::NotFound(Missing::Project(_)))
        ));
        assert!(matches!(
            MutationEngine::edit_release(&scope, "demo", "2.0", None),
            Err(CatalogError::NotFound(Missing::Release(_)))
        ));
    }

    #[test]
    fn register_build_defaults_and_duplicates() {
        let db = catalog_with_project();
        let scope = db.write().expect("write");
        MutationEngine::create_release(&scope, "demo", "1.0", "stable").expect("create");

        let (build, owner) =
            MutationEngine::register_build(&scope, "demo", "1.0", 1, "https://x/1").expect("build");
        assert!(!build.recommended);
        assert_eq!(build.url, "https://x/1");
        assert_eq!(owner, ReleaseStatus::Stable);

        assert!(matches!(
            MutationEngine::register_build(&scope, "demo", "1.0", 1, "https://x/other"),
            Err(CatalogError::AlreadyExists(_))
        ));
        assert!(matches!(
            MutationEngine::register_build(&scope, "demo", "9.9", 1, "https://x/1"),
            Err(CatalogError::NotFound(Missing::Release(_)))
        ));
        assert!(matches!(
            MutationEngine::register_build(&scope, "demo", "1.0", 2, ""),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn rejected_mutation_leaves_no_state() {
        let db = catalog_with_project();
        {
            let scope = db.write().expect("write");
            MutationEngine::create_release(&scope, "demo", "1.0", "stable").expect("create");
            let result = MutationEngine::register_build(&scope, "demo", "1.0", 1, "");
            assert!(result.is_err());
            // the caller drops the scope on error
        }
        let read = db.read().expect("read");
        assert!(read.release_with_version("1.0").expect("lookup").is_none());
    }
}
