//! # Catalog Primitives
//!
//! Hardcoded fan-out bounds and input limits for the catalog.
//!
//! Every listing bounds its child collections with one of the `*_LIMIT`
//! constants below. The bound is applied at the index cursor, so a project
//! with a long history costs the same to list as a young one.

use crate::CatalogError;

// =============================================================================
// FAN-OUT BOUNDS
// =============================================================================

/// Releases carried per project by listing and project lookup.
pub const RECENT_RELEASE_LIMIT: usize = 10;

/// Builds carried per release by project lookup and latest-per-tier resolution.
pub const RECENT_BUILD_LIMIT: usize = 10;

/// Builds carried per release by tier and exact-version lookups.
pub const DETAIL_BUILD_LIMIT: usize = 100;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a project slug.
pub const MAX_SLUG_LENGTH: usize = 30;

/// Maximum length of a project name.
pub const MAX_NAME_LENGTH: usize = 30;

/// Maximum length of a version string.
pub const MAX_VERSION_LENGTH: usize = 30;

/// Maximum length of a build download URL.
pub const MAX_URL_LENGTH: usize = 256;

/// Check that a required text field is present and within its limit.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<(), CatalogError> {
    if value.is_empty() {
        return Err(CatalogError::Validation(format!("{} not provided", field)));
    }
    if value.chars().count() > max {
        return Err(CatalogError::Validation(format!(
            "{} length {} exceeds maximum {}",
            field,
            value.chars().count(),
            max
        )));
    }
    Ok(())
}
