//! # Query Engine
//!
//! Read paths of the catalog. Every operation takes a [`CatalogRead`] scope
//! and performs all of its lookups against that one snapshot.
//!
//! Lookups happen in a fixed order: slug, then version or tier, then build
//! id. The first stage that comes up empty decides the `NotFound` detail.

use crate::primitives::{DETAIL_BUILD_LIMIT, RECENT_BUILD_LIMIT, RECENT_RELEASE_LIMIT};
use crate::storage::CatalogRead;
use crate::{Build, CatalogError, Missing, Project, ProjectView, Release, ReleaseStatus, ReleaseView};

/// The QueryEngine groups the catalog read operations.
pub struct QueryEngine;

impl QueryEngine {
    /// Every project with its most recently created releases and no builds.
    pub fn list_projects(scope: &impl CatalogRead) -> Result<Vec<ProjectView>, CatalogError> {
        scope
            .projects()?
            .into_iter()
            .map(|project| {
                let releases = scope
                    .recent_releases(project.id, RECENT_RELEASE_LIMIT)?
                    .into_iter()
                    .map(|release| Self::load_release(scope, release, 0))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ProjectView { project, releases })
            })
            .collect()
    }

    /// One project with its most recent releases, each with its most recent builds.
    pub fn project(scope: &impl CatalogRead, slug: &str) -> Result<ProjectView, CatalogError> {
        let project = Self::require_project(scope, slug)?;
        let releases = scope
            .recent_releases(project.id, RECENT_RELEASE_LIMIT)?
            .into_iter()
            .map(|release| Self::load_release(scope, release, RECENT_BUILD_LIMIT))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProjectView { project, releases })
    }

    /// The highest-versioned release of each of development, beta and stable.
    ///
    /// Each tier costs one index seek; no tier is scanned. Tiers without
    /// releases are left out. A project with none of them at all is reported
    /// as not found.
    pub fn latest_releases(
        scope: &impl CatalogRead,
        slug: &str,
    ) -> Result<ProjectView, CatalogError> {
        let project = Self::require_project(scope, slug)?;

        let mut releases = Vec::new();
        for tier in ReleaseStatus::LATEST_TIERS {
            if let Some(latest) = scope.highest_in_tier(project.id, tier)? {
                releases.push(Self::load_release(scope, latest, RECENT_BUILD_LIMIT)?);
            }
        }

        if releases.is_empty() {
            return Err(CatalogError::NotFound(Missing::Releases));
        }
        Ok(ProjectView { project, releases })
    }

    /// Every release of a project in the named tier, newest created first.
    pub fn latest_for_tier(
        scope: &impl CatalogRead,
        slug: &str,
        tier: &str,
    ) -> Result<Vec<ReleaseView>, CatalogError> {
        let tier = Self::parse_tier(tier)?;
        let project = Self::require_project(scope, slug)?;

        let releases = scope
            .releases_in_tier(project.id, tier, None)?
            .into_iter()
            .map(|release| Self::load_release(scope, release, DETAIL_BUILD_LIMIT))
            .collect::<Result<Vec<_>, _>>()?;

        if releases.is_empty() {
            return Err(CatalogError::NotFound(Missing::Tier(tier)));
        }
        Ok(releases)
    }

    /// The release of a project with exactly this version.
    pub fn release_by_version(
        scope: &impl CatalogRead,
        slug: &str,
        version: &str,
    ) -> Result<ReleaseView, CatalogError> {
        let project = Self::require_project(scope, slug)?;
        let release = Self::require_release(scope, &project, version)?;
        Self::load_release(scope, release, DETAIL_BUILD_LIMIT)
    }

    /// The newest build of the newest release in a tier.
    ///
    /// Exactly one candidate must remain: a tie on build time is as much a
    /// miss as an empty release.
    pub fn download_for_tier(
        scope: &impl CatalogRead,
        slug: &str,
        tier: &str,
    ) -> Result<Build, CatalogError> {
        let tier = Self::parse_tier(tier)?;
        let project = Self::require_project(scope, slug)?;

        let release = scope
            .releases_in_tier(project.id, tier, Some(1))?
            .into_iter()
            .next()
            .ok_or(CatalogError::NotFound(Missing::Tier(tier)))?;

        let mut newest = scope.latest_built(release.id, 2)?.into_iter();
        match (newest.next(), newest.next()) {
            (Some(first), Some(second)) if first.built_at == second.built_at => {
                tracing::debug!(version = %release.version, "latest build is ambiguous");
                Err(CatalogError::NotFound(Missing::LatestBuild))
            }
            (Some(first), _) => Ok(first),
            (None, _) => Err(CatalogError::NotFound(Missing::LatestBuild)),
        }
    }

    /// The build matching an exact (slug, version, build id) triple.
    pub fn download_for_build(
        scope: &impl CatalogRead,
        slug: &str,
        version: &str,
        build_id: u64,
    ) -> Result<Build, CatalogError> {
        let project = Self::require_project(scope, slug)?;
        let release = Self::require_release(scope, &project, version)?;
        scope
            .build(release.id, build_id)?
            .ok_or(CatalogError::NotFound(Missing::Build(build_id)))
    }

    /// The most recently built recommended build of a stable release.
    ///
    /// Any other status never has a recommended build.
    pub fn recommended_build(
        scope: &impl CatalogRead,
        release: &Release,
    ) -> Result<Option<Build>, CatalogError> {
        if !release.status.exposes_recommended() {
            return Ok(None);
        }
        scope.latest_recommended(release.id)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn parse_tier(tier: &str) -> Result<ReleaseStatus, CatalogError> {
        ReleaseStatus::from_name(tier).ok_or_else(|| CatalogError::InvalidTier(tier.to_string()))
    }

    fn require_project(scope: &impl CatalogRead, slug: &str) -> Result<Project, CatalogError> {
        scope
            .project_by_slug(slug)?
            .ok_or_else(|| CatalogError::NotFound(Missing::Project(slug.to_string())))
    }

    fn require_release(
        scope: &impl CatalogRead,
        project: &Project,
        version: &str,
    ) -> Result<Release, CatalogError> {
        scope
            .release_by_version(project.id, version)?
            .ok_or_else(|| CatalogError::NotFound(Missing::Release(version.to_string())))
    }

    fn load_release(
        scope: &impl CatalogRead,
        release: Release,
        build_limit: usize,
    ) -> Result<ReleaseView, CatalogError> {
        let builds = if build_limit == 0 {
            Vec::new()
        } else {
            scope.top_builds(release.id, build_limit)?
        };
        let recommended = Self::recommended_build(scope, &release)?;
        Ok(ReleaseView {
            release,
            builds,
            recommended,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
