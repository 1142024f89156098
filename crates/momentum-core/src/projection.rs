//! # Projection
//!
//! Converts loaded views into the payload shapes handed to the boundary.
//!
//! Field presence depends on release status:
//! - a build carries `recommended` only when its release is stable
//! - a release carries `builds` only when at least one build was loaded
//! - a release carries `recommended` only when it is stable and one resolved

use crate::{Build, ProjectView, ReleaseStatus, ReleaseView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPayload {
    /// The caller-facing build id, not the internal identity.
    pub id: u64,
    pub url: String,
    pub built_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<bool>,
}

impl BuildPayload {
    /// Project a build owned by a release in `owner` status.
    #[must_use]
    pub fn new(build: &Build, owner: ReleaseStatus) -> Self {
        Self {
            id: build.specific_build_id,
            url: build.url.clone(),
            built_at: build.built_at,
            recommended: owner.exposes_recommended().then_some(build.recommended),
        }
    }
}

/// Payload of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePayload {
    pub version: String,
    pub status: ReleaseStatus,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builds: Option<Vec<BuildPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<BuildPayload>,
}

impl From<&ReleaseView> for ReleasePayload {
    fn from(view: &ReleaseView) -> Self {
        let status = view.release.status;
        let builds = (!view.builds.is_empty()).then(|| {
            view.builds
                .iter()
                .map(|build| BuildPayload::new(build, status))
                .collect()
        });
        let recommended = view
            .recommended
            .as_ref()
            .filter(|_| status.exposes_recommended())
            .map(|build| BuildPayload::new(build, status));

        Self {
            version: view.release.version.clone(),
            status,
            created_at: view.release.created_at,
            released_at: view.release.released_at,
            builds,
            recommended,
        }
    }
}

/// Payload of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPayload {
    pub name: String,
    pub slug: String,
    pub releases: Vec<ReleasePayload>,
}

impl From<&ProjectView> for ProjectPayload {
    fn from(view: &ProjectView) -> Self {
        Self {
            name: view.project.name.clone(),
            slug: view.project.slug.clone(),
            releases: view.releases.iter().map(ReleasePayload::from).collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
