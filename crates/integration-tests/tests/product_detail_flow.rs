//! Product detail view driven end to end against the in-memory API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use fuki_core::{ProductId, Rating};
use fuki_integration_tests::{FakeApi, Read, Request, sample_product};
use fuki_storefront::api::{ApiError, AuthReview, Comment, Product, Review};
use fuki_storefront::views::product_detail::{
    COMMENT_CONTENT_REQUIRED, REVIEW_CONTENT_REQUIRED, REVIEW_RATE_REQUIRED,
};
use fuki_storefront::views::{ActionOutcome, ProductDetailView, ReviewPanel};
use reqwest::StatusCode;
use serde_json::json;

const PRODUCT: ProductId = ProductId::new(5);

fn seeded_comment() -> Comment {
    serde_json::from_value(json!({
        "id": 1,
        "content": "Does it ship to Da Nang?",
        "user": {"username": "minh"},
        "created_date": "2024-03-01T08:00:00Z",
        "replies": [{
            "id": 2,
            "content": "Yes",
            "user": {"username": "hanoi-leaf"},
            "created_date": "2024-03-01T09:00:00Z",
            "reply_to": 1
        }]
    }))
    .unwrap()
}

fn seeded_review() -> Review {
    serde_json::from_value(json!({
        "id": 1,
        "rate": 5,
        "content": "Fragrant",
        "user": {"username": "minh"},
        "created_date": "2024-03-01T08:00:00Z"
    }))
    .unwrap()
}

fn reviewed_product() -> Product {
    Product {
        auth_review: Some(AuthReview {
            rate: Some(3),
            content: Some("Decent".to_string()),
        }),
        ..sample_product()
    }
}

fn view(api: &Arc<FakeApi>) -> ProductDetailView<Arc<FakeApi>> {
    ProductDetailView::new(Arc::clone(api), PRODUCT)
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_load_fetches_all_parts() {
    let api = Arc::new(
        FakeApi::new()
            .with_comments(vec![seeded_comment()])
            .with_reviews(vec![seeded_review()]),
    );
    let view = view(&api);

    view.load().await.unwrap();

    let state = view.state();
    assert_eq!(state.product.unwrap().name, "Lotus tea");
    assert_eq!(state.comments.unwrap().len(), 1);
    assert_eq!(state.reviews.unwrap().len(), 1);

    let mut requests = api.requests();
    requests.sort_by_key(|r| format!("{r:?}"));
    assert_eq!(
        requests,
        vec![
            Request::Comments(PRODUCT),
            Request::Product(PRODUCT),
            Request::Reviews(PRODUCT),
        ]
    );

    let html = view.render().unwrap();
    assert!(html.contains("Lotus tea"));
    assert!(html.contains("Does it ship to Da Nang?"));
    assert!(html.contains("1 replies"));
    assert!(html.contains("Fragrant"));
}

#[tokio::test]
async fn test_failed_comments_load_leaves_comments_unloaded() {
    let api = Arc::new(
        FakeApi::new()
            .with_reviews(vec![seeded_review()])
            .failing_read(Read::Comments),
    );
    let view = view(&api);

    let err = view.load().await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            ..
        }
    ));
    let state = view.state();
    assert!(state.comments.is_none());
    assert_eq!(state.product.unwrap().name, "Lotus tea");
    assert_eq!(state.reviews.unwrap().len(), 1);

    let html = view.render().unwrap();
    assert!(html.contains("Loading comments..."));
    assert!(!html.contains("Loading reviews..."));
    assert!(html.contains("Fragrant"));
}

#[tokio::test]
async fn test_failed_product_load_keeps_page_loading() {
    let api = Arc::new(
        FakeApi::new()
            .with_comments(vec![seeded_comment()])
            .failing_read(Read::Product),
    );
    let view = view(&api);

    assert!(view.load().await.is_err());

    let state = view.state();
    assert!(state.product.is_none());
    assert_eq!(state.comments.unwrap().len(), 1);
    assert!(state.reviews.unwrap().is_empty());

    let html = view.render().unwrap();
    assert!(html.contains("aria-busy=\"true\""));
    assert!(!html.contains("<h2"));
}

// ============================================================================
// Comments
// ============================================================================

#[tokio::test]
async fn test_comment_requires_login() {
    let api = Arc::new(FakeApi::anonymous());
    let view = view(&api);
    view.set_comment_content("Nice");

    let outcome = view.add_comment().await;

    assert!(matches!(outcome, ActionOutcome::LoginRequired));
    assert!(api.requests().is_empty());
    assert_eq!(view.review_panel(), ReviewPanel::LoginPrompt);
}

#[tokio::test]
async fn test_empty_comment_is_not_sent() {
    let api = Arc::new(FakeApi::new().with_comments(vec![seeded_comment()]));
    let view = view(&api);
    view.load().await.unwrap();
    view.set_comment_content("   ");

    let outcome = view.add_comment().await;

    assert!(matches!(outcome, ActionOutcome::Invalid(ref m) if m == COMMENT_CONTENT_REQUIRED));
    let state = view.state();
    assert_eq!(state.comment_error.as_deref(), Some(COMMENT_CONTENT_REQUIRED));
    assert_eq!(state.comment_content, "   ");
    assert_eq!(state.comments.unwrap().len(), 1);
    assert_eq!(api.count(|r| matches!(r, Request::AddComment(..))), 0);
}

#[tokio::test]
async fn test_comment_is_prepended_and_input_cleared() {
    let api = Arc::new(FakeApi::new().with_comments(vec![seeded_comment()]));
    let view = view(&api);
    view.load().await.unwrap();
    view.set_comment_content("Arrived quickly");

    let outcome = view.add_comment().await;

    assert!(outcome.is_completed());
    let state = view.state();
    let comments = state.comments.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].content, "Arrived quickly");
    assert_eq!(comments[1].content, "Does it ship to Da Nang?");
    assert!(state.comment_content.is_empty());
    assert!(state.comment_error.is_none());
    assert!(!state.busy);

    // Product reloaded after the write
    assert_eq!(state.product.unwrap().total_comment, 1);
    assert_eq!(api.count(|r| matches!(r, Request::Product(_))), 2);
}

#[tokio::test]
async fn test_failed_comment_keeps_input() {
    let api = Arc::new(FakeApi::new().failing_writes());
    let view = view(&api);
    view.load().await.unwrap();
    view.set_comment_content("Arrived quickly");

    let outcome = view.add_comment().await;

    assert!(matches!(outcome, ActionOutcome::Failed(_)));
    let state = view.state();
    assert_eq!(state.comment_content, "Arrived quickly");
    assert!(state.comments.unwrap().is_empty());
    assert!(!state.busy);
}

#[tokio::test]
async fn test_concurrent_comment_is_rejected_while_busy() {
    let api = Arc::new(FakeApi::new());
    let view = view(&api);
    view.set_comment_content("Once");

    let (first, second) = tokio::join!(view.add_comment(), view.add_comment());

    assert!(first.is_completed());
    assert!(matches!(second, ActionOutcome::Busy));
    assert_eq!(api.count(|r| matches!(r, Request::AddComment(..))), 1);
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_review_requires_rate_then_content() {
    let api = Arc::new(FakeApi::new());
    let view = view(&api);
    view.load().await.unwrap();

    view.set_review_content("Lovely");
    let outcome = view.add_review().await;
    assert!(matches!(outcome, ActionOutcome::Invalid(ref m) if m == REVIEW_RATE_REQUIRED));

    view.set_review_rate(4);
    view.set_review_content("");
    let outcome = view.add_review().await;
    assert!(matches!(outcome, ActionOutcome::Invalid(ref m) if m == REVIEW_CONTENT_REQUIRED));

    let state = view.state();
    assert_eq!(state.review_error.as_deref(), Some(REVIEW_CONTENT_REQUIRED));
    assert_eq!(state.review_rate, 4);
    assert_eq!(state.reviews.unwrap().len(), 0);
    assert_eq!(api.count(|r| matches!(r, Request::AddReview(..))), 0);
}

#[tokio::test]
async fn test_review_is_prepended_then_locked() {
    let api = Arc::new(FakeApi::new().with_reviews(vec![seeded_review()]));
    let view = view(&api);
    view.load().await.unwrap();
    assert_eq!(view.review_panel(), ReviewPanel::Form);

    view.set_review_rate(4);
    view.set_review_content("Lovely");
    let outcome = view.add_review().await;

    assert!(outcome.is_completed());
    let state = view.state();
    let reviews = state.reviews.unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].content, "Lovely");
    assert_eq!(reviews[0].rate.map(Rating::stars), Some(4));
    assert_eq!(state.review_rate, 0);
    assert!(state.review_content.is_empty());

    // Reloaded product now carries the viewer's review
    assert_eq!(
        view.review_panel(),
        ReviewPanel::Submitted(AuthReview {
            rate: Some(4),
            content: Some("Lovely".to_string()),
        })
    );

    view.set_review_rate(5);
    view.set_review_content("Again");
    assert!(matches!(view.add_review().await, ActionOutcome::AlreadyReviewed));
    assert_eq!(api.count(|r| matches!(r, Request::AddReview(..))), 1);
}

#[tokio::test]
async fn test_failed_review_keeps_input() {
    let api = Arc::new(FakeApi::new().failing_writes());
    let view = view(&api);
    view.load().await.unwrap();
    view.set_review_rate(4);
    view.set_review_content("Lovely");

    let outcome = view.add_review().await;

    assert!(matches!(outcome, ActionOutcome::Failed(_)));
    let state = view.state();
    assert_eq!(state.review_rate, 4);
    assert_eq!(state.review_content, "Lovely");
    assert!(state.reviews.unwrap().is_empty());
    assert!(!state.busy);
    assert_eq!(view.review_panel(), ReviewPanel::Form);
    assert_eq!(api.count(|r| matches!(r, Request::Product(_))), 1);
}

#[tokio::test]
async fn test_existing_review_opens_read_only_modal() {
    let api = Arc::new(FakeApi::new().with_product(reviewed_product()));
    let view = view(&api);
    view.load().await.unwrap();

    assert!(matches!(view.review_panel(), ReviewPanel::Submitted(_)));

    view.open_review_modal();
    let html = view.render().unwrap();
    assert!(html.contains("<dialog open"));
    assert!(html.contains("Decent"));

    view.close_review_modal();
    assert!(!view.state().review_modal_open);
    assert!(!view.render().unwrap().contains("<dialog open"));
}

// ============================================================================
// Likes
// ============================================================================

#[tokio::test]
async fn test_like_toggle_reloads_product() {
    let api = Arc::new(FakeApi::new());
    let view = view(&api);
    view.load().await.unwrap();
    assert!(!view.is_liked());

    assert!(view.toggle_like().await.is_completed());
    assert!(view.is_liked());
    assert_eq!(view.state().like, Some(true));
    assert_eq!(api.requests().last(), Some(&Request::Product(PRODUCT)));

    assert!(view.toggle_like().await.is_completed());
    assert!(!view.is_liked());
    assert_eq!(api.count(|r| matches!(r, Request::Like(_))), 2);
}

#[tokio::test]
async fn test_like_ignores_unexpected_status() {
    let api = Arc::new(FakeApi::new().with_like_status(StatusCode::ACCEPTED));
    let view = view(&api);

    let outcome = view.toggle_like().await;

    assert!(matches!(outcome, ActionOutcome::Unexpected(StatusCode::ACCEPTED)));
    assert_eq!(view.state().like, None);
    assert_eq!(api.requests(), vec![Request::Like(PRODUCT)]);
}

#[tokio::test]
async fn test_like_requires_login() {
    let api = Arc::new(FakeApi::anonymous());
    let view = view(&api);

    assert!(matches!(view.toggle_like().await, ActionOutcome::LoginRequired));
    assert!(api.requests().is_empty());
}
