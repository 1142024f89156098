//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::AppConfig;
use crate::error::AppError;
use momentum_core::{
    Catalog, CatalogError, CatalogRead, Missing, ProjectPayload, ReleasePayload,
};
use serde::Serialize;
use std::path::Path;

/// How `download` picks its build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// Newest build of the newest release in a tier.
    Tier(String),
    /// One exact build.
    Build { version: String, build_id: u64 },
}

fn open_catalog(db_path: &Path) -> Result<Catalog, AppError> {
    Ok(Catalog::open(db_path)?)
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn print_release(release: &ReleasePayload, indent: &str) {
    let released = release
        .released_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}{} [{}] created {} released {}",
        indent,
        release.version,
        release.status,
        release.created_at.to_rfc3339(),
        released
    );
    if let Some(recommended) = &release.recommended {
        println!("{}  recommended: build {}", indent, recommended.id);
    }
    for build in release.builds.iter().flatten() {
        let marker = if build.recommended == Some(true) {
            " *"
        } else {
            ""
        };
        println!(
            "{}  build {}{}  {}  {}",
            indent,
            build.id,
            marker,
            build.built_at.to_rfc3339(),
            build.url
        );
    }
}

fn print_project(project: &ProjectPayload) {
    println!("{} ({})", project.name, project.slug);
    if project.releases.is_empty() {
        println!("  no releases");
    }
    for release in &project.releases {
        print_release(release, "  ");
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig) -> Result<(), AppError> {
    let catalog = open_catalog(&config.database)?;

    println!("Momentum Release Catalog Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Database: {:?}", config.database);
    println!();
    println!("Endpoints:");
    println!("  GET  /v1/releases                          - List projects");
    println!("  GET  /v1/releases/{{slug}}                   - Show a project");
    println!("  GET  /v1/releases/{{slug}}/versions/latest   - Latest releases");
    println!("  PUT  /v1/releases/{{slug}}/versions          - Create a release");
    println!("  GET  /health                               - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(catalog, &config.server).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty catalog.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), AppError> {
    if db_path.exists() {
        if !force {
            return Err(AppError::Usage(format!(
                "Database {:?} already exists (use --force to replace it)",
                db_path
            )));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| AppError::Io(format!("Cannot remove {:?}: {}", db_path, e)))?;
    }

    open_catalog(db_path)?;
    tracing::info!(path = ?db_path, "catalog initialized");
    println!("Initialized empty catalog at {:?}", db_path);
    Ok(())
}

/// Compact the database file in place.
pub fn cmd_compact(db_path: &Path) -> Result<(), AppError> {
    let mut catalog = open_catalog(db_path)?;
    if catalog.compact()? {
        println!("Compacted {:?}", db_path);
    } else {
        println!("{:?} is already compact", db_path);
    }
    Ok(())
}

// =============================================================================
// MUTATION COMMANDS
// =============================================================================

/// Register a project.
pub fn cmd_add_project(
    db_path: &Path,
    json_mode: bool,
    name: &str,
    slug: &str,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let project = catalog.create_project(name, slug)?;

    if json_mode {
        print_json(&serde_json::json!({
            "ok": true,
            "project": { "name": project.name, "slug": project.slug }
        }));
    } else {
        println!("Created project {} ({})", project.name, project.slug);
    }
    Ok(())
}

/// Create a release.
pub fn cmd_add_release(
    db_path: &Path,
    json_mode: bool,
    slug: &str,
    version: &str,
    status: &str,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let release = catalog.create_release(slug, version, status)?;

    if json_mode {
        print_json(&api::ReleaseMutationResponse::success(
            release.version,
            release.status,
        ));
    } else {
        println!(
            "Created release {} of {} [{}]",
            release.version, slug, release.status
        );
    }
    Ok(())
}

/// Change the status of a release.
pub fn cmd_edit_release(
    db_path: &Path,
    json_mode: bool,
    slug: &str,
    version: &str,
    status: Option<&str>,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let release = catalog.edit_release(slug, version, status)?;

    if json_mode {
        print_json(&api::ReleaseMutationResponse::success(
            release.version,
            release.status,
        ));
    } else {
        println!(
            "Release {} of {} is now [{}]",
            release.version, slug, release.status
        );
    }
    Ok(())
}

/// Register a build.
pub fn cmd_add_build(
    db_path: &Path,
    json_mode: bool,
    slug: &str,
    version: &str,
    build_id: u64,
    url: &str,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let (build, _) = catalog.register_build(slug, version, build_id, url)?;

    if json_mode {
        print_json(&serde_json::json!({
            "ok": true,
            "build": {
                "id": build.specific_build_id,
                "url": build.url,
                "built_at": build.built_at,
            }
        }));
    } else {
        println!(
            "Registered build {} of {} {}",
            build.specific_build_id, slug, version
        );
    }
    Ok(())
}

/// Flag or unflag a build as recommended.
///
/// This writes to the store directly; the catalog itself never changes the flag.
pub fn cmd_recommend(
    db_path: &Path,
    json_mode: bool,
    slug: &str,
    version: &str,
    build_id: u64,
    recommended: bool,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let scope = catalog.db().write()?;

    let project = scope
        .project_by_slug(slug)?
        .ok_or_else(|| CatalogError::NotFound(Missing::Project(slug.to_string())))?;
    let release = scope
        .release_by_version(project.id, version)?
        .ok_or_else(|| CatalogError::NotFound(Missing::Release(version.to_string())))?;
    let build = scope
        .build(release.id, build_id)?
        .ok_or(CatalogError::NotFound(Missing::Build(build_id)))?;

    let updated = scope.set_recommended(&build, recommended)?;
    scope.commit()?;
    tracing::info!(slug, version, build_id, recommended, "recommended flag updated");

    if json_mode {
        print_json(&serde_json::json!({
            "ok": true,
            "build": { "id": updated.specific_build_id, "recommended": updated.recommended }
        }));
    } else if !release.status.exposes_recommended() {
        println!(
            "Build {} flagged, but release {} is [{}]; the flag shows once it is stable",
            build_id, version, release.status
        );
    } else {
        println!(
            "Build {} of {} {} recommended: {}",
            build_id, slug, version, updated.recommended
        );
    }
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

/// List projects with their recent releases.
pub fn cmd_list(db_path: &Path, json_mode: bool) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let projects = catalog.list_projects()?;

    if json_mode {
        print_json(&api::ProjectsResponse::success(projects));
        return Ok(());
    }

    println!("Momentum Catalog");
    println!("================");
    if projects.is_empty() {
        println!("No projects");
    }
    for project in &projects {
        print_project(project);
    }
    Ok(())
}

/// Show one project.
pub fn cmd_show(db_path: &Path, json_mode: bool, slug: &str) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let project = catalog.project(slug)?;

    if json_mode {
        print_json(&api::ProjectResponse::success(project));
    } else {
        print_project(&project);
    }
    Ok(())
}

/// Show the latest releases, or every release of one tier.
pub fn cmd_latest(
    db_path: &Path,
    json_mode: bool,
    slug: &str,
    tier: Option<&str>,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;

    match tier {
        None => {
            let project = catalog.latest_releases(slug)?;
            if json_mode {
                print_json(&api::ProjectResponse::success(project));
            } else {
                print_project(&project);
            }
        }
        Some(tier) => {
            let releases = catalog.latest_for_tier(slug, tier)?;
            if json_mode {
                let response = api::TierResponse::success(releases)
                    .ok_or(CatalogError::NotFound(Missing::Releases))?;
                print_json(&response);
            } else {
                for release in &releases {
                    print_release(release, "");
                }
            }
        }
    }
    Ok(())
}

/// Show one release.
pub fn cmd_release(
    db_path: &Path,
    json_mode: bool,
    slug: &str,
    version: &str,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let release = catalog.release(slug, version)?;

    if json_mode {
        print_json(&api::ReleaseResponse::success(release));
    } else {
        print_release(&release, "");
    }
    Ok(())
}

/// Resolve a download URL.
pub fn cmd_download(
    db_path: &Path,
    json_mode: bool,
    slug: &str,
    target: &DownloadTarget,
) -> Result<(), AppError> {
    let catalog = open_catalog(db_path)?;
    let url = match target {
        DownloadTarget::Tier(tier) => catalog.download_for_tier(slug, tier)?,
        DownloadTarget::Build { version, build_id } => {
            catalog.download_for_build(slug, version, *build_id)?
        }
    };

    if json_mode {
        print_json(&serde_json::json!({ "ok": true, "url": url }));
    } else {
        println!("{}", url);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.redb");

        cmd_init(&path, false).expect("first init");
        assert!(matches!(cmd_init(&path, false), Err(AppError::Usage(_))));
        cmd_init(&path, true).expect("forced init");
    }

    #[test]
    fn compact_keeps_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.redb");

        cmd_add_project(&path, true, "Demo", "demo").expect("project");
        cmd_compact(&path).expect("compact");
        let catalog = open_catalog(&path).expect("open");
        assert_eq!(catalog.project("demo").expect("project").slug, "demo");
    }

    #[test]
    fn commands_share_one_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.redb");

        cmd_add_project(&path, true, "Demo", "demo").expect("project");
        cmd_add_release(&path, true, "demo", "1.0.0", "stable").expect("release");
        cmd_add_build(&path, true, "demo", "1.0.0", 1, "https://x/1").expect("build");
        cmd_recommend(&path, true, "demo", "1.0.0", 1, true).expect("recommend");

        let catalog = open_catalog(&path).expect("open");
        let release = catalog.release("demo", "1.0.0").expect("release");
        assert_eq!(release.recommended.map(|b| b.id), Some(1));
    }

    #[test]
    fn recommend_unknown_build_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.redb");

        cmd_add_project(&path, true, "Demo", "demo").expect("project");
        cmd_add_release(&path, true, "demo", "1.0.0", "stable").expect("release");
        assert!(matches!(
            cmd_recommend(&path, true, "demo", "1.0.0", 7, true),
            Err(AppError::Catalog(CatalogError::NotFound(Missing::Build(7))))
        ));
    }

    #[test]
    fn download_by_build() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.redb");

        cmd_add_project(&path, true, "Demo", "demo").expect("project");
        cmd_add_release(&path, true, "demo", "1.0.0", "beta").expect("release");
        cmd_add_build(&path, true, "demo", "1.0.0", 4, "https://x/4").expect("build");

        let target = DownloadTarget::Build {
            version: "1.0.0".to_string(),
            build_id: 4,
        };
        cmd_download(&path, true, "demo", &target).expect("download");
        let missing = DownloadTarget::Tier("stable".to_string());
        assert!(cmd_download(&path, true, "demo", &missing).is_err());
    }
}
