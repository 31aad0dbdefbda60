//! Fuki storefront library.
//!
//! Client-side state for the Fuki marketplace: a typed client for the
//! storefront REST API, the shared shopping cart, and the checkout and
//! product detail views rendered with Askama.
//!
//! # Modules
//!
//! - [`api`] - REST client and API data types
//! - [`cart`] - shared cart store
//! - [`config`] - environment configuration
//! - [`error`] - application error type and Sentry breadcrumbs
//! - [`views`] - checkout and product detail controllers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod views;

pub use api::{ApiClient, ApiError, StorefrontApi};
pub use cart::{CartLine, CartStore};
pub use config::StorefrontConfig;
pub use error::{AppError, Result};
