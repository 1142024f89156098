//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use momentum::api::{
    ApiError, CreateReleaseForm, ErrorResponse, HealthResponse, ProjectsResponse,
    ReleaseMutationResponse, TierResponse,
};
use momentum_core::{CatalogError, Missing, ReleasePayload, ReleaseStatus};

fn release(version: &str) -> ReleasePayload {
    serde_json::from_str(&format!(
        r#"{{"version":"{}","status":"stable","created_at":"2024-01-01T00:00:00Z","released_at":null}}"#,
        version
    ))
    .unwrap()
}

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

// =============================================================================
// ENVELOPE TESTS
// =============================================================================

#[test]
fn test_projects_envelope_shape() {
    let json = serde_json::to_value(ProjectsResponse::success(Vec::new())).unwrap();
    assert_eq!(json, serde_json::json!({ "ok": true, "projects": [] }));
}

#[test]
fn test_error_envelope_shape() {
    let json = serde_json::to_value(ErrorResponse::error("Not found")).unwrap();
    assert_eq!(json, serde_json::json!({ "ok": false, "error": "Not found" }));
}

#[test]
fn test_release_mutation_uses_status_name() {
    let json = serde_json::to_string(&ReleaseMutationResponse::success(
        "1.2.3".to_string(),
        ReleaseStatus::Maintenance,
    ))
    .unwrap();
    assert!(json.contains("\"status\":\"maintenance\""));
    assert!(json.contains("\"ok\":true"));
}

#[test]
fn test_tier_response_first_release_is_newest() {
    let response = TierResponse::success(vec![release("2.0"), release("1.0")]).unwrap();
    assert_eq!(response.release.version, "2.0");
    assert_eq!(response.releases.len(), 2);
    assert!(TierResponse::success(Vec::new()).is_none());
}

#[test]
fn test_release_payload_optional_keys_default() {
    let payload = release("1.0");
    assert!(payload.builds.is_none());
    assert!(payload.recommended.is_none());
    assert_eq!(payload.released_at, None);
}

// =============================================================================
// FORM TESTS
// =============================================================================

#[test]
fn test_create_release_form_fields_optional() {
    let form: CreateReleaseForm = serde_json::from_str(r#"{"version":"1.0"}"#).unwrap();
    assert_eq!(form.version.as_deref(), Some("1.0"));
    assert!(form.status.is_none());
}

// =============================================================================
// ERROR MAPPING TESTS
// =============================================================================

#[test]
fn test_error_status_codes() {
    let cases = [
        (
            CatalogError::NotFound(Missing::Project("x".to_string())),
            StatusCode::NOT_FOUND,
        ),
        (CatalogError::NotFound(Missing::LatestBuild), StatusCode::NOT_FOUND),
        (
            CatalogError::InvalidStatus("gold".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            CatalogError::InvalidTier("gold".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            CatalogError::InvalidVersion("1.x".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            CatalogError::Validation("missing".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            CatalogError::AlreadyExists("release 1.0".to_string()),
            StatusCode::CONFLICT,
        ),
        (
            CatalogError::Store("disk".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(ApiError::from(error).status(), expected);
    }
}
