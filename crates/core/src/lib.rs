//! Fuki Core - Shared types library.
//!
//! This crate provides common types used across all Fuki components:
//! - `storefront` - API client, cart store and storefront views
//! - `cli` - Command-line driver for the storefront views
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and ratings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
