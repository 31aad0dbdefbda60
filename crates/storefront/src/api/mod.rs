//! Storefront REST API access.
//!
//! # Architecture
//!
//! - Views talk to the API through the [`StorefrontApi`] trait so they can be
//!   driven by an in-memory fake in tests
//! - [`ApiClient`] is the production implementation (`reqwest`)
//! - The API is the source of truth - NO local cache, every load hits it
//!
//! # Example
//!
//! ```rust,ignore
//! use fuki_storefront::api::{ApiClient, StorefrontApi};
//!
//! let client = ApiClient::new(&config)?;
//!
//! let product = client.product(ProductId::new(5)).await?;
//! let comments = client.comments(product.id).await?;
//! ```

mod client;
pub mod endpoints;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use std::future::Future;
use std::sync::Arc;

use fuki_core::ProductId;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Status {
        status: StatusCode,
        body: serde_json::Value,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// An authenticated endpoint was called without credentials.
    #[error("Not authenticated")]
    Unauthenticated,
}

impl ApiError {
    /// Flatten the error into a single display message.
    ///
    /// For rejected requests the API returns a map of field name to error
    /// messages; every value is joined into one string, each followed by a
    /// space, in the order the API sent the fields. Other errors fall back to their `Display` text.
    #[must_use]
    pub fn field_messages(&self) -> String {
        match self {
            Self::Status {
                body: serde_json::Value::Object(fields),
                ..
            } => fields
                .values()
                .map(|value| format!("{} ", flatten_value(value)))
                .collect(),
            Self::Status {
                body: serde_json::Value::String(text),
                ..
            } => text.clone(),
            other => other.to_string(),
        }
    }
}

fn flatten_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .collect::<Vec<_>>()
            .join(","),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A parsed response together with its HTTP status.
///
/// Returned by endpoints whose callers act on the exact success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a response wrapper.
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self { status, data }
    }
}

/// Operations the storefront views need from the API.
///
/// Implemented by [`ApiClient`] for real traffic.
pub trait StorefrontApi: Send + Sync {
    /// Whether requests carry a user credential.
    fn is_authenticated(&self) -> bool;

    /// List the payment methods offered at checkout.
    fn payment_methods(&self) -> impl Future<Output = Result<Vec<PaymentMethod>, ApiError>> + Send;

    /// Place an order. Succeeds with status 201 when the order was created.
    fn checkout(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<ApiResponse<serde_json::Value>, ApiError>> + Send;

    /// Fetch a product, including the viewer's like and review state.
    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// List a product's comments, newest first.
    fn comments(&self, id: ProductId)
    -> impl Future<Output = Result<Vec<Comment>, ApiError>> + Send;

    /// Post a comment on a product.
    fn add_comment(
        &self,
        id: ProductId,
        comment: &NewComment,
    ) -> impl Future<Output = Result<Comment, ApiError>> + Send;

    /// List a product's reviews, newest first.
    fn reviews(&self, id: ProductId) -> impl Future<Output = Result<Vec<Review>, ApiError>> + Send;

    /// Post a review of a product.
    fn add_review(
        &self,
        id: ProductId,
        review: &NewReview,
    ) -> impl Future<Output = Result<Review, ApiError>> + Send;

    /// Toggle the viewer's like on a product.
    fn like_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ApiResponse<LikeStatus>, ApiError>> + Send;
}

impl<T: StorefrontApi> StorefrontApi for Arc<T> {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn payment_methods(&self) -> impl Future<Output = Result<Vec<PaymentMethod>, ApiError>> + Send {
        (**self).payment_methods()
    }

    fn checkout(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<ApiResponse<serde_json::Value>, ApiError>> + Send {
        (**self).checkout(order)
    }

    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, ApiError>> + Send {
        (**self).product(id)
    }

    fn comments(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Vec<Comment>, ApiError>> + Send {
        (**self).comments(id)
    }

    fn add_comment(
        &self,
        id: ProductId,
        comment: &NewComment,
    ) -> impl Future<Output = Result<Comment, ApiError>> + Send {
        (**self).add_comment(id, comment)
    }

    fn reviews(&self, id: ProductId) -> impl Future<Output = Result<Vec<Review>, ApiError>> + Send {
        (**self).reviews(id)
    }

    fn add_review(
        &self,
        id: ProductId,
        review: &NewReview,
    ) -> impl Future<Output = Result<Review, ApiError>> + Send {
        (**self).add_review(id, review)
    }

    fn like_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ApiResponse<LikeStatus>, ApiError>> + Send {
        (**self).like_product(id)
    }
}
