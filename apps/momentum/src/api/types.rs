//! # API Request/Response Types
//!
//! Every body is a JSON envelope: `ok` plus either the payload fields or
//! `error`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use momentum_core::{
    BuildPayload, CatalogError, ErrorKind, ProjectPayload, ReleasePayload, ReleaseStatus,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// QUERY RESPONSES
// =============================================================================

/// Listing of every project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsResponse {
    pub ok: bool,
    pub projects: Vec<ProjectPayload>,
}

impl ProjectsResponse {
    #[must_use]
    pub fn success(projects: Vec<ProjectPayload>) -> Self {
        Self { ok: true, projects }
    }
}

/// One project with its releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub ok: bool,
    pub project: ProjectPayload,
}

impl ProjectResponse {
    #[must_use]
    pub fn success(project: ProjectPayload) -> Self {
        Self { ok: true, project }
    }
}

/// One release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub ok: bool,
    pub release: ReleasePayload,
}

impl ReleaseResponse {
    #[must_use]
    pub fn success(release: ReleasePayload) -> Self {
        Self { ok: true, release }
    }
}

/// Releases of one tier. `release` is the newest; `releases` holds them all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierResponse {
    pub ok: bool,
    pub release: ReleasePayload,
    pub releases: Vec<ReleasePayload>,
}

impl TierResponse {
    /// `None` when `releases` is empty.
    #[must_use]
    pub fn success(releases: Vec<ReleasePayload>) -> Option<Self> {
        let release = releases.first()?.clone();
        Some(Self {
            ok: true,
            release,
            releases,
        })
    }
}

// =============================================================================
// MUTATION REQUESTS/RESPONSES
// =============================================================================

/// Form body of release creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReleaseForm {
    pub version: Option<String>,
    pub status: Option<String>,
}

/// Form body of a release edit. Without `status` the edit changes nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditReleaseForm {
    pub status: Option<String>,
}

/// Form body of build registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterBuildForm {
    pub url: Option<String>,
}

/// Summary of a created or edited release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationReleaseJson {
    pub version: String,
    pub status: ReleaseStatus,
}

/// Release mutation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseMutationResponse {
    pub ok: bool,
    pub release: MutationReleaseJson,
}

impl ReleaseMutationResponse {
    #[must_use]
    pub fn success(version: String, status: ReleaseStatus) -> Self {
        Self {
            ok: true,
            release: MutationReleaseJson { version, status },
        }
    }
}

/// Build registration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildMutationResponse {
    pub ok: bool,
    pub build: BuildPayload,
}

impl BuildMutationResponse {
    #[must_use]
    pub fn success(build: BuildPayload) -> Self {
        Self { ok: true, build }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }
}

/// A catalog error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CatalogError);

impl ApiError {
    /// A missing or malformed request field.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(CatalogError::Validation(message.into()))
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(error: CatalogError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "Internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse::error(message))).into_response()
    }
}
