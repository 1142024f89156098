//! # Application Errors
//!
//! Failures of the binary itself: configuration, startup and the catalog
//! errors that surface through CLI commands.

use crate::config::ConfigError;
use momentum_core::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Usage(String),
}
