//! # API Endpoint Handlers
//!
//! Each handler extracts its parameters, makes one catalog call and wraps
//! the result in the JSON envelope. No catalog logic lives here.

use super::{
    AppState,
    types::{
        ApiError, BuildMutationResponse, CreateReleaseForm, EditReleaseForm, HealthResponse,
        ProjectResponse, ProjectsResponse, RegisterBuildForm, ReleaseMutationResponse,
        ReleaseResponse, TierResponse,
    },
};
use axum::{
    Form, Json,
    extract::{Path, State, rejection::FormRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use momentum_core::{BuildPayload, CatalogError, Missing};

type ApiResult<T> = Result<T, ApiError>;

/// Build ids arrive as path text; anything but an unsigned integer is rejected.
fn parse_build_id(raw: &str) -> ApiResult<u64> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Build id is invalid: {}", raw)))
}

fn form_body<T>(form: Result<Form<T>, FormRejection>) -> ApiResult<T> {
    form.map(|Form(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// Like `form_body`, but a request without a form content type reads as an
/// empty form.
fn optional_form_body<T: Default>(form: Result<Form<T>, FormRejection>) -> ApiResult<T> {
    match form {
        Err(FormRejection::InvalidFormContentType(_)) => Ok(T::default()),
        other => form_body(other),
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// QUERY HANDLERS
// =============================================================================

/// `GET /v1/releases`
pub async fn list_projects_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<ProjectsResponse>> {
    let projects = state.catalog.list_projects()?;
    Ok(Json(ProjectsResponse::success(projects)))
}

/// `GET /v1/releases/{slug}`
pub async fn project_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = state.catalog.project(&slug)?;
    Ok(Json(ProjectResponse::success(project)))
}

/// `GET /v1/releases/{slug}/versions/latest`
pub async fn latest_releases_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = state.catalog.latest_releases(&slug)?;
    Ok(Json(ProjectResponse::success(project)))
}

/// `GET /v1/releases/{slug}/versions/latest/{tier}`
pub async fn latest_for_tier_handler(
    State(state): State<AppState>,
    Path((slug, tier)): Path<(String, String)>,
) -> ApiResult<Json<TierResponse>> {
    let releases = state.catalog.latest_for_tier(&slug, &tier)?;
    let response = TierResponse::success(releases)
        .ok_or_else(|| ApiError::from(CatalogError::NotFound(Missing::Releases)))?;
    Ok(Json(response))
}

/// `GET /v1/releases/{slug}/versions/{version}`
pub async fn release_handler(
    State(state): State<AppState>,
    Path((slug, version)): Path<(String, String)>,
) -> ApiResult<Json<ReleaseResponse>> {
    let release = state.catalog.release(&slug, &version)?;
    Ok(Json(ReleaseResponse::success(release)))
}

// =============================================================================
// DOWNLOAD HANDLERS
// =============================================================================

/// `GET /v1/releases/{slug}/versions/latest/{tier}/download`
pub async fn download_tier_handler(
    State(state): State<AppState>,
    Path((slug, tier)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let url = state.catalog.download_for_tier(&slug, &tier)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

/// `GET /v1/releases/{slug}/versions/{version}/builds/{build_id}/download`
pub async fn download_build_handler(
    State(state): State<AppState>,
    Path((slug, version, build_id)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let build_id = parse_build_id(&build_id)?;
    let url = state
        .catalog
        .download_for_build(&slug, &version, build_id)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

// =============================================================================
// MUTATION HANDLERS
// =============================================================================

/// `PUT /v1/releases/{slug}/versions`
pub async fn create_release_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    form: Result<Form<CreateReleaseForm>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let form = form_body(form)?;
    let status = form
        .status
        .ok_or_else(|| ApiError::validation("Status of release not provided"))?;
    let version = form
        .version
        .ok_or_else(|| ApiError::validation("Version for release not provided"))?;

    let release = state.catalog.create_release(&slug, &version, &status)?;
    Ok((
        StatusCode::CREATED,
        Json(ReleaseMutationResponse::success(
            release.version,
            release.status,
        )),
    ))
}

/// `PUT /v1/releases/{slug}/versions/{version}`
pub async fn edit_release_handler(
    State(state): State<AppState>,
    Path((slug, version)): Path<(String, String)>,
    form: Result<Form<EditReleaseForm>, FormRejection>,
) -> ApiResult<Json<ReleaseMutationResponse>> {
    let form = optional_form_body(form)?;
    let release = state
        .catalog
        .edit_release(&slug, &version, form.status.as_deref())?;
    Ok(Json(ReleaseMutationResponse::success(
        release.version,
        release.status,
    )))
}

/// `PUT /v1/releases/{slug}/versions/{version}/builds/{build_id}`
pub async fn register_build_handler(
    State(state): State<AppState>,
    Path((slug, version, build_id)): Path<(String, String, String)>,
    form: Result<Form<RegisterBuildForm>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let build_id = parse_build_id(&build_id)?;
    let form = form_body(form)?;
    let url = form
        .url
        .ok_or_else(|| ApiError::validation("Url of build not provided"))?;

    let (build, owner) = state
        .catalog
        .register_build(&slug, &version, build_id, &url)?;
    Ok((
        StatusCode::CREATED,
        Json(BuildMutationResponse::success(BuildPayload::new(
            &build, owner,
        ))),
    ))
}
