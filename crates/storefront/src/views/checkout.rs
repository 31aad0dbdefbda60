//! Checkout view.
//!
//! Shows the cart contents and totals, collects receiver details and a
//! payment method, and places the order. A created order (HTTP 201) resets
//! the form and empties the cart; a rejected one shows the API's field
//! errors flattened into one message.

use askama::Template;
use fuki_core::Price;
use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::instrument;

use super::try_begin;
use crate::api::{ApiError, NewOrder, OrderDetail, PaymentMethod, StorefrontApi};
use crate::cart::{self, CartLine, CartStore};
use crate::error::add_breadcrumb;

/// Receiver and payment fields of the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    /// Selected payment method ID; empty until one is chosen.
    pub payment_method: String,
}

/// Render-ready checkout state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutState {
    pub form: CheckoutForm,
    /// `None` until the payment methods have loaded.
    pub payment_methods: Option<Vec<PaymentMethod>>,
    /// A checkout request is outstanding.
    pub busy: bool,
    /// Message from the last rejected checkout.
    pub error: Option<String>,
}

/// Result of submitting the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Order created; the payload is the API's order record.
    Placed(serde_json::Value),
    /// The API accepted the request without creating an order.
    NotCreated(StatusCode),
    /// The API rejected the order; the message is also stored on the view.
    Rejected(String),
    /// A previous submission is still outstanding.
    Busy,
}

/// Project cart lines into order lines.
#[must_use]
pub fn order_details(lines: &[CartLine]) -> Vec<OrderDetail> {
    lines
        .iter()
        .map(|line| OrderDetail {
            product: line.id,
            quantity: line.quantity,
            unit_price: line.price,
        })
        .collect()
}

/// Checkout page controller.
pub struct CheckoutView<A> {
    api: A,
    cart: CartStore,
    state: watch::Sender<CheckoutState>,
}

impl<A> std::fmt::Debug for CheckoutView<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutView")
            .field("cart", &self.cart)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<A: StorefrontApi> CheckoutView<A> {
    /// Create a checkout view over a shared cart.
    #[must_use]
    pub fn new(api: A, cart: CartStore) -> Self {
        let (state, _) = watch::channel(CheckoutState::default());
        Self { api, cart, state }
    }

    /// The cart this view checks out.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state.borrow().clone()
    }

    /// Watch the view state for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    /// Total number of items in the cart.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.cart.total_quantity()
    }

    /// Total price of the cart.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.cart.total_price()
    }

    /// Load the payment methods offered at checkout.
    ///
    /// On failure the list stays unloaded and the error is logged.
    ///
    /// # Errors
    ///
    /// Returns the API error so callers can decide whether to retry.
    #[instrument(skip(self))]
    pub async fn load_payment_methods(&self) -> Result<(), ApiError> {
        match self.api.payment_methods().await {
            Ok(methods) => {
                self.state
                    .send_modify(|s| s.payment_methods = Some(methods));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load payment methods");
                Err(e)
            }
        }
    }

    pub fn set_receiver_name(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.form.receiver_name = value);
    }

    pub fn set_receiver_phone(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.form.receiver_phone = value);
    }

    pub fn set_receiver_address(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.form.receiver_address = value);
    }

    pub fn set_payment_method(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.form.payment_method = value);
    }

    /// Order payload for the current form and cart.
    #[must_use]
    pub fn order(&self) -> NewOrder {
        let form = self.state.borrow().form.clone();
        NewOrder {
            receiver_name: form.receiver_name,
            receiver_phone: form.receiver_phone,
            receiver_address: form.receiver_address,
            payment_method: form.payment_method,
            order_details: order_details(&self.cart.lines()),
        }
    }

    /// Place the order.
    ///
    /// Only an HTTP 201 counts as success: the form resets and the cart is
    /// emptied. Any other outcome leaves the cart untouched.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> CheckoutOutcome {
        if !try_begin(&self.state, |s| &mut s.busy) {
            return CheckoutOutcome::Busy;
        }

        let order = self.order();
        let line_count = order.order_details.len().to_string();
        add_breadcrumb(
            "checkout",
            "Submitted order",
            Some(&[("lines", line_count.as_str())]),
        );

        let outcome = match self.api.checkout(&order).await {
            Ok(response) if response.status == StatusCode::CREATED => {
                tracing::info!(lines = order.order_details.len(), "Order placed");
                self.cart.clear();
                CheckoutOutcome::Placed(response.data)
            }
            Ok(response) => {
                tracing::warn!(status = %response.status, "Checkout did not create an order");
                CheckoutOutcome::NotCreated(response.status)
            }
            Err(e) => {
                tracing::error!(error = %e, "Checkout failed");
                CheckoutOutcome::Rejected(e.field_messages())
            }
        };

        self.state.send_modify(|s| {
            s.busy = false;
            match &outcome {
                CheckoutOutcome::Placed(_) => {
                    s.form = CheckoutForm::default();
                    s.error = None;
                }
                CheckoutOutcome::Rejected(message) => s.error = Some(message.clone()),
                CheckoutOutcome::NotCreated(_) | CheckoutOutcome::Busy => {}
            }
        });

        outcome
    }

    /// Build the page template for the current state.
    #[must_use]
    pub fn page(&self) -> CheckoutPage {
        CheckoutPage::new(&self.state(), self.cart.lines())
    }

    /// Render the page to HTML.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render.
    pub fn render(&self) -> Result<String, askama::Error> {
        self.page().render()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Payment method entry of the select box.
#[derive(Debug, Clone)]
pub struct PaymentOptionView {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Cart line display data.
#[derive(Debug, Clone)]
pub struct CheckoutLineView {
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    pub quantity: u32,
}

/// Checkout page template.
#[derive(Debug, Template)]
#[template(path = "checkout.html")]
pub struct CheckoutPage {
    pub form: CheckoutForm,
    pub payment_loaded: bool,
    pub payment_options: Vec<PaymentOptionView>,
    pub lines: Vec<CheckoutLineView>,
    pub quantity: u32,
    pub total_price: String,
    pub busy: bool,
    pub error: Option<String>,
}

impl CheckoutPage {
    fn new(state: &CheckoutState, lines: Vec<CartLine>) -> Self {
        let payment_options = state
            .payment_methods
            .iter()
            .flatten()
            .map(|method| {
                let id = method.id.to_string();
                PaymentOptionView {
                    selected: id == state.form.payment_method,
                    id,
                    name: method.name.clone(),
                }
            })
            .collect();

        Self {
            form: state.form.clone(),
            payment_loaded: state.payment_methods.is_some(),
            payment_options,
            quantity: cart::total_quantity(&lines),
            total_price: cart::total_price(&lines).to_string(),
            lines: lines
                .into_iter()
                .map(|line| CheckoutLineView {
                    name: line.name,
                    image: line.image,
                    price: line.price.to_string(),
                    quantity: line.quantity,
                })
                .collect(),
            busy: state.busy,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fuki_core::{PaymentMethodId, ProductId};

    fn line(id: i32, price: i64, quantity: u32) -> CartLine {
        CartLine {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            image: Some(format!("https://cdn.example.com/{id}.png")),
            price: Price::from_units(price),
            quantity,
        }
    }

    #[test]
    fn test_order_details_mirror_cart_lines() {
        let lines = vec![line(1, 100_000, 2), line(2, 50_000, 1)];
        let details = order_details(&lines);

        assert_eq!(
            details,
            vec![
                OrderDetail {
                    product: ProductId::new(1),
                    quantity: 2,
                    unit_price: Price::from_units(100_000),
                },
                OrderDetail {
                    product: ProductId::new(2),
                    quantity: 1,
                    unit_price: Price::from_units(50_000),
                },
            ]
        );
    }

    #[test]
    fn test_order_details_json_shape() {
        let details = order_details(&[line(1, 100_000, 2)]);
        assert_eq!(
            serde_json::to_value(details).unwrap(),
            serde_json::json!([{"product": 1, "quantity": 2, "unit_price": 100000}])
        );
    }

    #[test]
    fn test_page_marks_selected_payment_method() {
        let state = CheckoutState {
            form: CheckoutForm {
                payment_method: "2".to_string(),
                ..CheckoutForm::default()
            },
            payment_methods: Some(vec![
                PaymentMethod {
                    id: PaymentMethodId::new(1),
                    name: "Cash".to_string(),
                },
                PaymentMethod {
                    id: PaymentMethodId::new(2),
                    name: "MoMo".to_string(),
                },
            ]),
            ..CheckoutState::default()
        };

        let page = CheckoutPage::new(&state, vec![line(1, 100_000, 2)]);
        assert!(page.payment_loaded);
        assert!(!page.payment_options[0].selected);
        assert!(page.payment_options[1].selected);
        assert_eq!(page.quantity, 2);
        assert_eq!(page.total_price, "200000");
    }

    #[test]
    fn test_render_busy_replaces_submit_button() {
        let state = CheckoutState {
            busy: true,
            ..CheckoutState::default()
        };
        let html = CheckoutPage::new(&state, vec![]).render().unwrap();
        assert!(html.contains("aria-busy=\"true\""));
        assert!(!html.contains("type=\"submit\""));
    }

    #[test]
    fn test_render_shows_error_and_lines() {
        let state = CheckoutState {
            error: Some("This field may not be blank. ".to_string()),
            ..CheckoutState::default()
        };
        let html = CheckoutPage::new(&state, vec![line(7, 30_000, 3)])
            .render()
            .unwrap();
        assert!(html.contains("This field may not be blank."));
        assert!(html.contains("Product 7"));
        assert!(html.contains("90000"));
        assert!(html.contains("type=\"submit\""));
    }
}
