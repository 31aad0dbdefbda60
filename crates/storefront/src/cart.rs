//! Shopping cart store.
//!
//! The cart is owned outside the views. Views receive a [`CartStore`] handle,
//! read snapshots from it and request a full clear after checkout. Anything
//! that renders cart contents can [`subscribe`](CartStore::subscribe) and
//! re-render when the lines change.

use std::sync::Arc;

use fuki_core::{Price, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// A line was added with a zero quantity.
    #[error("Quantity for product {0} must be at least 1")]
    ZeroQuantity(ProductId),
}

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Total item count over a set of cart lines.
#[must_use]
pub fn total_quantity(lines: &[CartLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}

/// Total price over a set of cart lines.
#[must_use]
pub fn total_price(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}

/// Shared handle to the cart contents.
///
/// Cloning the handle shares the same cart.
#[derive(Debug, Clone)]
pub struct CartStore {
    sender: Arc<watch::Sender<Vec<CartLine>>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lines(Vec::new())
    }

    /// Create a cart holding `lines`.
    #[must_use]
    pub fn with_lines(lines: Vec<CartLine>) -> Self {
        let (sender, _) = watch::channel(lines);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.sender.borrow().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sender.borrow().is_empty()
    }

    /// Total item count.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        total_quantity(&self.sender.borrow())
    }

    /// Total price of all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        total_price(&self.sender.borrow())
    }

    /// Add a line. A line for a product already in the cart bumps its
    /// quantity instead of appending a duplicate.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` if `line.quantity` is 0.
    pub fn add(&self, line: CartLine) -> Result<(), CartError> {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity(line.id));
        }

        self.sender.send_modify(|lines| {
            match lines.iter_mut().find(|existing| existing.id == line.id) {
                Some(existing) => existing.quantity += line.quantity,
                None => lines.push(line),
            }
        });
        Ok(())
    }

    /// Remove every line.
    pub fn clear(&self) {
        self.sender.send_if_modified(|lines| {
            if lines.is_empty() {
                return false;
            }
            lines.clear();
            true
        });
        tracing::debug!("Cart cleared");
    }

    /// Watch the cart for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartLine>> {
        self.sender.subscribe()
    }
}
