//! # Momentum
//!
//! HTTP server and CLI over the `momentum-core` release catalog.
//!
//! - `api` → axum router under `/v1/releases`
//! - `cli` → clap commands for operators
//! - `config` → TOML + environment settings

pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use error::AppError;
