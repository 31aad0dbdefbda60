//! Storefront views.
//!
//! Each view owns its state in a `tokio::sync::watch` channel: the view's own
//! methods are the only writers, and renderers subscribe to re-draw whenever
//! the state changes. Network calls are explicit method calls; nothing is
//! refetched implicitly.
//!
//! # Views
//!
//! - [`CheckoutView`] - checkout form over the shared cart
//! - [`ProductDetailView`] - product page with reviews, comments and likes

pub mod checkout;
pub mod product_detail;

pub use checkout::{CheckoutForm, CheckoutOutcome, CheckoutPage, CheckoutState, CheckoutView};
pub use product_detail::{ProductDetailPage, ProductDetailState, ProductDetailView, ReviewPanel};

use reqwest::StatusCode;
use tokio::sync::watch;

use crate::api::ApiError;

/// Result of a user action on a view.
#[derive(Debug)]
pub enum ActionOutcome {
    /// The request succeeded and the view state was updated.
    Completed,
    /// Input failed validation; the message is also stored on the view.
    Invalid(String),
    /// The action needs a signed-in user.
    LoginRequired,
    /// The user already reviewed this product.
    AlreadyReviewed,
    /// Another submission from this view is still outstanding.
    Busy,
    /// The API answered with a success status the view does not act on.
    Unexpected(StatusCode),
    /// The API request failed. The failure has been logged.
    Failed(ApiError),
}

impl ActionOutcome {
    /// Whether the action reached the API and succeeded.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Atomically raise a view's busy flag.
///
/// Returns `false` when the flag was already raised, i.e. another submission
/// is outstanding.
fn try_begin<S>(state: &watch::Sender<S>, busy: impl Fn(&mut S) -> &mut bool) -> bool {
    state.send_if_modified(|s| {
        let flag = busy(s);
        if *flag {
            return false;
        }
        *flag = true;
        true
    })
}
