//! Endpoint paths, relative to the configured API base URL.

use fuki_core::ProductId;

/// Payment methods offered at checkout.
pub const PAYMENT_METHODS: &str = "payment-methods/";

/// Order creation.
pub const CHECKOUT: &str = "orders/checkout/";

/// Single product detail.
#[must_use]
pub fn product_detail(id: ProductId) -> String {
    format!("products/{id}/")
}

/// Comments listing and creation for a product.
#[must_use]
pub fn comments(id: ProductId) -> String {
    format!("products/{id}/comments/")
}

/// Reviews listing and creation for a product.
#[must_use]
pub fn reviews(id: ProductId) -> String {
    format!("products/{id}/reviews/")
}

/// Like toggle for a product.
#[must_use]
pub fn like_product(id: ProductId) -> String {
    format!("products/{id}/like/")
}
