//! CLI subcommands.

pub mod checkout;
pub mod product;

use std::path::PathBuf;

use fuki_storefront::AppError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Storefront failure (config, API, cart, template).
    #[error(transparent)]
    App(#[from] AppError),

    /// Cart file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Cart file is not valid YAML for a list of cart lines.
    #[error("Invalid cart file {}: {source}", path.display())]
    CartFile {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The action was refused; the message explains why.
    #[error("{0}")]
    Refused(String),
}

impl CliError {
    /// Log the error, reporting storefront failures to Sentry.
    pub fn report(&self) {
        match self {
            Self::App(e) => e.report(),
            other => tracing::error!(error = %other, "Command failed"),
        }
    }
}

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
fn emit(text: &str) {
    println!("{text}");
}
