//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for callers that drive the views end to
//! end (the CLI), plus breadcrumb helpers the views use to leave a trail of
//! user actions in Sentry reports.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::config::ConfigError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storefront API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Page template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// User input was rejected before reaching the API.
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl AppError {
    /// Report the error to Sentry and log it.
    ///
    /// Only API and template failures are captured; configuration and input
    /// errors are the operator's to fix.
    pub fn report(&self) {
        if matches!(self, Self::Api(_) | Self::Template(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Storefront error");
        } else {
            tracing::error!(error = %self, "Storefront error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("product", "Posted comment", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
