//! `reqwest` implementation of the storefront API.

use std::sync::Arc;

use fuki_core::ProductId;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::endpoints;
use super::types::{
    Comment, LikeStatus, NewComment, NewOrder, NewReview, PaymentMethod, Product, Review,
};
use super::{ApiError, ApiResponse, StorefrontApi};
use crate::config::ApiConfig;

/// How a request uses the configured credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Never send the credential.
    Anonymous,
    /// Send the credential when one is configured.
    IfAvailable,
    /// Fail without a credential.
    Required,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.inner.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fuki-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Issue a request and parse the JSON response.
    async fn execute<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.inner.base_url.join(path)?;
        let mut request = self.inner.client.request(method, url);

        match (auth, &self.inner.token) {
            (Auth::Anonymous, _) | (Auth::IfAvailable, None) => {}
            (Auth::IfAvailable | Auth::Required, Some(token)) => {
                request = request.bearer_auth(token.expose_secret());
            }
            (Auth::Required, None) => return Err(ApiError::Unauthenticated),
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Storefront API returned non-success status"
            );
            let body = serde_json::from_str(&response_text)
                .unwrap_or(serde_json::Value::String(response_text));
            return Err(ApiError::Status { status, body });
        }

        let text = if response_text.trim().is_empty() {
            "null"
        } else {
            response_text.as_str()
        };

        let data = serde_json::from_str(text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })?;

        debug!(status = %status, "Storefront API request succeeded");
        Ok(ApiResponse::new(status, data))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<T, ApiError> {
        self.execute::<(), T>(Method::GET, path, None, auth)
            .await
            .map(|response| response.data)
    }

    async fn post<B, T>(
        &self,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, body, auth).await
    }
}

impl StorefrontApi for ApiClient {
    fn is_authenticated(&self) -> bool {
        self.inner.token.is_some()
    }

    #[instrument(skip(self))]
    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, ApiError> {
        self.get(endpoints::PAYMENT_METHODS, Auth::Anonymous).await
    }

    #[instrument(skip(self, order), fields(lines = order.order_details.len()))]
    async fn checkout(&self, order: &NewOrder) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        self.post(endpoints::CHECKOUT, Some(order), Auth::Required)
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.get(&endpoints::product_detail(id), Auth::IfAvailable)
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn comments(&self, id: ProductId) -> Result<Vec<Comment>, ApiError> {
        self.get(&endpoints::comments(id), Auth::Anonymous).await
    }

    #[instrument(skip(self, comment), fields(product_id = %id))]
    async fn add_comment(&self, id: ProductId, comment: &NewComment) -> Result<Comment, ApiError> {
        self.post(&endpoints::comments(id), Some(comment), Auth::Required)
            .await
            .map(|response| response.data)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn reviews(&self, id: ProductId) -> Result<Vec<Review>, ApiError> {
        self.get(&endpoints::reviews(id), Auth::Anonymous).await
    }

    #[instrument(skip(self, review), fields(product_id = %id, rate = %review.rate))]
    async fn add_review(&self, id: ProductId, review: &NewReview) -> Result<Review, ApiError> {
        self.post(&endpoints::reviews(id), Some(review), Auth::Required)
            .await
            .map(|response| response.data)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn like_product(&self, id: ProductId) -> Result<ApiResponse<LikeStatus>, ApiError> {
        self.post::<(), _>(&endpoints::like_product(id), None, Auth::Required)
            .await
    }
}
