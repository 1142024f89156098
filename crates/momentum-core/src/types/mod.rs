//! # Core Type Definitions
//!
//! This module contains the catalog entities and their supporting types:
//! - Internal identifiers (`ProjectId`, `ReleaseId`, `BuildId`)
//! - Release lifecycle stages (`ReleaseStatus`)
//! - Stored entities (`Project`, `Release`, `Build`) and their insert forms
//! - Loaded views carrying bounded child collections (`ProjectView`, `ReleaseView`)
//! - Error types (`CatalogError`, `Missing`, `ErrorKind`)
//!
//! ## Ownership
//!
//! A Project exclusively owns its Releases and a Release exclusively owns its
//! Builds. Children reference their parent by id; nothing here is shared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Internal identity of a project. Callers address projects by slug instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

/// Internal identity of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReleaseId(pub u64);

/// Internal identity of a build.
///
/// Not to be confused with `Build::specific_build_id`, the caller-facing
/// number that is only unique within its release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildId(pub u64);

// =============================================================================
// RELEASE STATUS
// =============================================================================

/// Lifecycle stage of a release.
///
/// The declaration order is only used for storage codes. Statuses are never
/// compared for ordering; they select releases, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Development,
    Beta,
    Stable,
    Maintenance,
    Unsupported,
}

impl ReleaseStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Development,
        Self::Beta,
        Self::Stable,
        Self::Maintenance,
        Self::Unsupported,
    ];

    /// The tiers that take part in latest-release resolution.
    pub const LATEST_TIERS: [Self; 3] = [Self::Development, Self::Beta, Self::Stable];

    /// Canonical name, as used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Beta => "beta",
            Self::Stable => "stable",
            Self::Maintenance => "maintenance",
            Self::Unsupported => "unsupported",
        }
    }

    /// Look up a status by its canonical name.
    ///
    /// The match is exact and case-sensitive: `"Stable"` is not recognized.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.name() == name)
    }

    /// Compact code used inside storage index keys.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Development => 0,
            Self::Beta => 1,
            Self::Stable => 2,
            Self::Maintenance => 3,
            Self::Unsupported => 4,
        }
    }

    /// Whether builds of a release in this status expose the recommended flag.
    #[must_use]
    pub const fn exposes_recommended(self) -> bool {
        matches!(self, Self::Stable)
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A project served by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Globally unique lookup key used by callers.
    pub slug: String,
}

/// A release of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub project_id: ProjectId,
    /// Dot-separated non-negative integers. Unique across the whole catalog.
    pub version: String,
    pub status: ReleaseStatus,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

/// A concrete build of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub release_id: ReleaseId,
    /// Caller-supplied number, unique within the owning release.
    pub specific_build_id: u64,
    /// Only meaningful while the owning release is stable.
    pub recommended: bool,
    /// Opaque download location.
    pub url: String,
    pub built_at: DateTime<Utc>,
}

/// Insert form of a [`Project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub slug: String,
}

/// Insert form of a [`Release`].
///
/// Timestamps left as `None` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    pub project_id: ProjectId,
    pub version: String,
    pub status: ReleaseStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
}

impl NewRelease {
    /// A release created now, not yet released.
    #[must_use]
    pub fn new(project_id: ProjectId, version: impl Into<String>, status: ReleaseStatus) -> Self {
        Self {
            project_id,
            version: version.into(),
            status,
            created_at: None,
            released_at: None,
        }
    }

    /// Pin the creation time instead of letting the store assign it.
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Record when the release shipped. Never set by the engine's own
    /// mutations, which leave a new release unreleased.
    #[must_use]
    pub fn released_at(mut self, at: DateTime<Utc>) -> Self {
        self.released_at = Some(at);
        self
    }
}

/// Insert form of a [`Build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBuild {
    pub release_id: ReleaseId,
    pub specific_build_id: u64,
    pub url: String,
    pub recommended: bool,
    pub built_at: Option<DateTime<Utc>>,
}

impl NewBuild {
    /// A non-recommended build produced now.
    #[must_use]
    pub fn new(release_id: ReleaseId, specific_build_id: u64, url: impl Into<String>) -> Self {
        Self {
            release_id,
            specific_build_id,
            url: url.into(),
            recommended: false,
            built_at: None,
        }
    }

    /// Pin the build time instead of letting the store assign it.
    #[must_use]
    pub fn built_at(mut self, at: DateTime<Utc>) -> Self {
        self.built_at = Some(at);
        self
    }
}

// =============================================================================
// LOADED VIEWS
// =============================================================================

/// A release together with the builds a query chose to load for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseView {
    pub release: Release,
    /// Bounded, ordered by `specific_build_id` descending. May be empty.
    pub builds: Vec<Build>,
    /// Resolved recommended build. Always `None` unless the release is stable.
    pub recommended: Option<Build>,
}

/// A project together with the releases a query chose to load for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    pub project: Project,
    pub releases: Vec<ReleaseView>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// The lookup stage at which a catalog query came up empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    /// No project has this slug.
    Project(String),
    /// The project has no release with this version.
    Release(String),
    /// The project has no release in this tier.
    Tier(ReleaseStatus),
    /// The release has no build with this id.
    Build(u64),
    /// The release has no unambiguous latest build.
    LatestBuild,
    /// The project has no release in any latest-resolution tier.
    Releases,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(slug) => write!(f, "No such project found: {}", slug),
            Self::Release(version) => write!(f, "No such release found: {}", version),
            Self::Tier(status) => write!(f, "No matching release found for tier {}", status),
            Self::Build(id) => write!(f, "No matching build found: {}", id),
            Self::LatestBuild => f.write_str("No matching builds found"),
            Self::Releases => f.write_str("Not found"),
        }
    }
}

/// Externally visible error category, used by the boundary to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    Conflict,
    Internal,
}

/// Errors that can occur in the catalog.
///
/// Everything but `Store` and `Serialization` is an expected, caller-facing
/// outcome. Those two are system faults and carry only a stringified cause.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(Missing),

    #[error("Status is invalid: {0}")]
    InvalidStatus(String),

    #[error("Tier is invalid: {0}")]
    InvalidTier(String),

    #[error("Version is invalid: {0}")]
    InvalidVersion(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    /// Category of this error for boundary mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidStatus(_)
            | Self::InvalidTier(_)
            | Self::InvalidVersion(_)
            | Self::Validation(_) => ErrorKind::Invalid,
            Self::AlreadyExists(_) => ErrorKind::Conflict,
            Self::Store(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_round_trip() {
        for status in ReleaseStatus::ALL {
            assert_eq!(ReleaseStatus::from_name(status.name()), Some(status));
        }
    }

    #[test]
    fn status_lookup_is_case_sensitive() {
        assert_eq!(ReleaseStatus::from_name("stable"), Some(ReleaseStatus::Stable));
        assert_eq!(ReleaseStatus::from_name("Stable"), None);
        assert_eq!(ReleaseStatus::from_name("STABLE"), None);
        assert_eq!(ReleaseStatus::from_name(" stable"), None);
        assert_eq!(ReleaseStatus::from_name("nightly"), None);
    }

    #[test]
    fn status_codes_are_distinct() {
        let mut codes: Vec<u8> = ReleaseStatus::ALL.iter().map(|s| s.code()).collect();
        codes.dedup();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn only_stable_exposes_recommended() {
        for status in ReleaseStatus::ALL {
            assert_eq!(status.exposes_recommended(), status == ReleaseStatus::Stable);
        }
    }

    #[test]
    fn status_serializes_as_lowercase_name() {
        let json = serde_json::to_string(&ReleaseStatus::Maintenance).expect("serialize");
        assert_eq!(json, "\"maintenance\"");
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            CatalogError::NotFound(Missing::Build(3)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CatalogError::InvalidTier("x".into()).kind(),
            ErrorKind::Invalid
        );
        assert_eq!(
            CatalogError::AlreadyExists("1.0".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(CatalogError::Store("io".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn not_found_messages_name_the_stage() {
        let err = CatalogError::NotFound(Missing::Project("demo".into()));
        assert_eq!(err.to_string(), "No such project found: demo");
        let err = CatalogError::NotFound(Missing::Tier(ReleaseStatus::Beta));
        assert_eq!(err.to_string(), "No matching release found for tier beta");
    }
}
