//! # Momentum - Release Catalog Server
//!
//! The main binary for the Momentum release catalog.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for catalog operations
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  apps/momentum (THE BINARY)                  │
//! │                                                             │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐    │
//! │   │    CLI      │    │  HTTP API   │    │    Config    │    │
//! │   │   (clap)    │    │   (axum)    │    │ (toml + env) │    │
//! │   └──────┬──────┘    └──────┬──────┘    └──────┬───────┘    │
//! │          │                  │                  │            │
//! │          └──────────────────┼──────────────────┘            │
//! │                             ▼                               │
//! │                    ┌─────────────────┐                      │
//! │                    │  momentum-core  │                      │
//! │                    │   (THE LOGIC)   │                      │
//! │                    └─────────────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! momentum server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! momentum add-project "Demo" demo
//! momentum add-release demo 1.0.0 --status stable
//! momentum add-build demo 1.0.0 1 --url https://example.com/demo-1.0.0.tar.gz
//! momentum latest demo
//! ```

use clap::Parser;
use momentum::cli;
use momentum::config::{AppConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }

    init_tracing(&config);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` takes precedence over the configured filter.
fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter().into());

    match config.log.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Print the Momentum startup banner.
fn print_banner() {
    println!(
        r#"
  momentum v{}
  release catalog
"#,
        env!("CARGO_PKG_VERSION")
    );
}
