//! Checkout command.
//!
//! Reads cart lines from a YAML file, fills the checkout form and places the
//! order.
//!
//! # Cart File
//!
//! ```yaml
//! - id: 1
//!   name: Lotus tea
//!   price: 100000
//!   quantity: 2
//! - id: 2
//!   name: Bamboo basket
//!   image: https://cdn.example.com/basket.png
//!   price: 50000
//!   quantity: 1
//! ```

use std::path::{Path, PathBuf};

use clap::Args;
use fuki_storefront::cart::{CartLine, CartStore};
use fuki_storefront::views::{CheckoutOutcome, CheckoutView};
use fuki_storefront::{AppError, StorefrontApi};

use super::{CliError, emit};

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// YAML file listing the cart lines
    #[arg(long)]
    pub cart: PathBuf,

    /// Receiver name
    #[arg(long)]
    pub name: String,

    /// Receiver phone number
    #[arg(long)]
    pub phone: String,

    /// Delivery address
    #[arg(long)]
    pub address: String,

    /// Payment method ID
    #[arg(long)]
    pub payment_method: String,

    /// Print the rendered checkout page after submitting
    #[arg(long)]
    pub html: bool,
}

/// Load a cart from a YAML file.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed, or a line has a zero
/// quantity.
pub async fn load_cart(path: &Path) -> Result<CartStore, CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let lines: Vec<CartLine> =
        serde_yaml::from_str(&content).map_err(|source| CliError::CartFile {
            path: path.to_path_buf(),
            source,
        })?;

    let cart = CartStore::new();
    for line in lines {
        cart.add(line).map_err(AppError::from)?;
    }

    tracing::info!(
        path = %path.display(),
        quantity = cart.total_quantity(),
        total = %cart.total_price(),
        "Loaded cart"
    );
    Ok(cart)
}

/// Place an order for the cart file's lines.
///
/// # Errors
///
/// Returns error if the cart is empty or invalid, payment methods fail to
/// load, or the API does not create the order.
pub async fn run<A: StorefrontApi>(api: A, args: CheckoutArgs) -> Result<(), CliError> {
    let cart = load_cart(&args.cart).await?;
    if cart.is_empty() {
        return Err(CliError::Refused("The cart is empty".to_string()));
    }

    let view = CheckoutView::new(api, cart);
    view.load_payment_methods().await.map_err(AppError::from)?;

    view.set_receiver_name(args.name);
    view.set_receiver_phone(args.phone);
    view.set_receiver_address(args.address);
    view.set_payment_method(args.payment_method);

    let outcome = view.submit().await;

    if args.html {
        emit(&view.render().map_err(AppError::from)?);
    }

    match outcome {
        CheckoutOutcome::Placed(order) => {
            if !args.html {
                emit(&serde_json::to_string_pretty(&order).unwrap_or_else(|_| order.to_string()));
            }
            Ok(())
        }
        CheckoutOutcome::NotCreated(status) => Err(CliError::Refused(format!(
            "Order was not created (status {status})"
        ))),
        CheckoutOutcome::Rejected(message) => Err(CliError::Refused(message)),
        CheckoutOutcome::Busy => Err(CliError::Refused(
            "A checkout is already in progress".to_string(),
        )),
    }
}
