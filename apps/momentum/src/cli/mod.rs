//! # Momentum CLI Module
//!
//! This module implements the CLI interface for Momentum.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new catalog database
//! - `compact` - Compact the catalog database file
//! - `add-project` - Register a project
//! - `add-release` - Create a release of a project
//! - `edit-release` - Change the status of a release
//! - `add-build` - Register a build of a release
//! - `recommend` - Flag a build of a stable release as recommended
//! - `list` - List projects with their recent releases
//! - `show` - Show one project
//! - `latest` - Show the latest releases, optionally of one tier
//! - `release` - Show one release
//! - `download` - Resolve a download URL

mod commands;

use crate::config::AppConfig;
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Momentum - release catalog
///
/// Tracks projects, their releases and the downloadable builds of each release.
#[derive(Parser, Debug)]
#[command(name = "momentum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the catalog database (overrides configuration)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty catalog
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Compact the catalog database file
    Compact,

    /// Register a project
    AddProject {
        /// Display name
        name: String,

        /// Unique lookup slug
        slug: String,
    },

    /// Create a release of a project
    AddRelease {
        slug: String,
        version: String,

        /// development, beta, stable, maintenance or unsupported
        #[arg(short, long)]
        status: String,
    },

    /// Change the status of a release
    EditRelease {
        slug: String,
        version: String,

        /// New status; omitted leaves the release unchanged
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Register a build of a release
    AddBuild {
        slug: String,
        version: String,
        build_id: u64,

        /// Download location of the build
        #[arg(short, long)]
        url: String,
    },

    /// Flag a build as recommended
    Recommend {
        slug: String,
        version: String,
        build_id: u64,

        /// Clear the flag instead of setting it
        #[arg(long)]
        unset: bool,
    },

    /// List projects with their recent releases
    List,

    /// Show one project with its recent releases and builds
    Show { slug: String },

    /// Show the latest development, beta and stable releases
    Latest {
        slug: String,

        /// Show every release of this tier instead
        #[arg(short, long)]
        tier: Option<String>,
    },

    /// Show one release
    Release { slug: String, version: String },

    /// Resolve a download URL, by tier or by version and build id
    Download {
        slug: String,

        #[arg(short, long, conflicts_with_all = ["version", "build"])]
        tier: Option<String>,

        #[arg(short, long, requires = "build")]
        version: Option<String>,

        #[arg(short, long, requires = "version")]
        build: Option<u64>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and resolved configuration.
pub async fn execute(cli: Cli, mut config: AppConfig) -> Result<(), AppError> {
    let json_mode = cli.json_mode;
    let db_path = config.database.clone();

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(&db_path, force),
        Some(Commands::Compact) => cmd_compact(&db_path),
        Some(Commands::AddProject { name, slug }) => {
            cmd_add_project(&db_path, json_mode, &name, &slug)
        }
        Some(Commands::AddRelease {
            slug,
            version,
            status,
        }) => cmd_add_release(&db_path, json_mode, &slug, &version, &status),
        Some(Commands::EditRelease {
            slug,
            version,
            status,
        }) => cmd_edit_release(&db_path, json_mode, &slug, &version, status.as_deref()),
        Some(Commands::AddBuild {
            slug,
            version,
            build_id,
            url,
        }) => cmd_add_build(&db_path, json_mode, &slug, &version, build_id, &url),
        Some(Commands::Recommend {
            slug,
            version,
            build_id,
            unset,
        }) => cmd_recommend(&db_path, json_mode, &slug, &version, build_id, !unset),
        Some(Commands::Show { slug }) => cmd_show(&db_path, json_mode, &slug),
        Some(Commands::Latest { slug, tier }) => {
            cmd_latest(&db_path, json_mode, &slug, tier.as_deref())
        }
        Some(Commands::Release { slug, version }) => {
            cmd_release(&db_path, json_mode, &slug, &version)
        }
        Some(Commands::Download {
            slug,
            tier,
            version,
            build,
        }) => {
            let target = match (tier, version, build) {
                (Some(tier), None, None) => DownloadTarget::Tier(tier),
                (None, Some(version), Some(build_id)) => DownloadTarget::Build { version, build_id },
                _ => {
                    return Err(AppError::Usage(
                        "download needs either --tier or --version with --build".to_string(),
                    ));
                }
            };
            cmd_download(&db_path, json_mode, &slug, &target)
        }
        // No subcommand - list by default
        Some(Commands::List) | None => cmd_list(&db_path, json_mode),
    }
}
