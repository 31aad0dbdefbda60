//! Product detail commands.

use std::fmt::Write;

use fuki_core::{ProductId, Rating};
use fuki_storefront::views::{ActionOutcome, ProductDetailState, ProductDetailView};
use fuki_storefront::{AppError, StorefrontApi};

use super::{CliError, emit};

/// Map a view action outcome onto the command result.
fn finish(outcome: ActionOutcome) -> Result<(), CliError> {
    match outcome {
        ActionOutcome::Completed => Ok(()),
        ActionOutcome::Invalid(message) => Err(CliError::Refused(message)),
        ActionOutcome::LoginRequired => Err(CliError::Refused(
            "You need to log in first (set FUKI_API_TOKEN)".to_string(),
        )),
        ActionOutcome::AlreadyReviewed => Err(CliError::Refused(
            "You have already reviewed this product".to_string(),
        )),
        ActionOutcome::Busy => Err(CliError::Refused(
            "Another submission is still in progress".to_string(),
        )),
        ActionOutcome::Unexpected(status) => Err(CliError::Refused(format!(
            "Unexpected response status {status}"
        ))),
        ActionOutcome::Failed(e) => Err(AppError::from(e).into()),
    }
}

/// Plain-text summary of a loaded product page.
fn summary(state: &ProductDetailState, liked: bool) -> String {
    let mut out = String::new();
    let Some(product) = &state.product else {
        return out;
    };

    let _ = writeln!(out, "{} ({})", product.name, product.price);
    let _ = writeln!(
        out,
        "Shop: {} | Category: {}",
        product.shop.name, product.category.name
    );
    let _ = writeln!(
        out,
        "Rating: {:.1} from {} reviews | {} comments | {}",
        product.avg_rate,
        product.total_review,
        product.total_comment,
        if liked { "liked" } else { "not liked" }
    );

    for review in state.reviews.iter().flatten() {
        let _ = writeln!(
            out,
            "  [{}/5] {}: {}",
            review.rate.map_or(0, Rating::stars),
            review.user.username,
            review.content
        );
    }
    for comment in state.comments.iter().flatten() {
        let _ = writeln!(out, "  > {}: {}", comment.user.username, comment.content);
    }
    out
}

/// Show a product with its reviews and comments.
///
/// # Errors
///
/// Returns error if any part of the page fails to load or render.
pub async fn show<A: StorefrontApi>(api: A, id: ProductId, html: bool) -> Result<(), CliError> {
    let view = ProductDetailView::new(api, id);
    view.load().await.map_err(AppError::from)?;

    if html {
        emit(&view.render().map_err(AppError::from)?);
    } else {
        emit(&summary(&view.state(), view.is_liked()));
    }
    Ok(())
}

/// Post a comment on a product.
///
/// # Errors
///
/// Returns error if the content is empty, no token is configured, or the API
/// rejects the comment.
pub async fn comment<A: StorefrontApi>(
    api: A,
    id: ProductId,
    content: String,
) -> Result<(), CliError> {
    let view = ProductDetailView::new(api, id);
    view.set_comment_content(content);
    finish(view.add_comment().await)?;
    tracing::info!(product_id = %id, "Comment posted");
    Ok(())
}

/// Post a review of a product.
///
/// The product is loaded first so an existing review is detected before
/// anything is sent.
///
/// # Errors
///
/// Returns error if the product fails to load, the review is invalid or
/// already submitted, or the API rejects it.
pub async fn review<A: StorefrontApi>(
    api: A,
    id: ProductId,
    rate: u8,
    content: String,
) -> Result<(), CliError> {
    let view = ProductDetailView::new(api, id);
    view.reload_product().await.map_err(AppError::from)?;

    view.set_review_rate(rate);
    view.set_review_content(content);
    finish(view.add_review().await)?;
    tracing::info!(product_id = %id, rate, "Review posted");
    Ok(())
}

/// Toggle the like on a product and print the new state.
///
/// # Errors
///
/// Returns error if no token is configured or the API rejects the toggle.
pub async fn like<A: StorefrontApi>(api: A, id: ProductId) -> Result<(), CliError> {
    let view = ProductDetailView::new(api, id);
    finish(view.toggle_like().await)?;
    emit(if view.is_liked() { "liked" } else { "not liked" });
    Ok(())
}
