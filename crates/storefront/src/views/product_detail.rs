//! Product detail view.
//!
//! Loads a product together with its comments and reviews, and exposes the
//! three write actions of the page: posting a comment, posting a review and
//! toggling the like. After each successful write the product is reloaded
//! explicitly so counters, the like state and the viewer's own review stay
//! current.

use askama::Template;
use fuki_core::{ProductId, Rating};
use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::instrument;

use super::{ActionOutcome, try_begin};
use crate::api::{
    ApiError, AuthReview, Comment, NewComment, NewReview, Product, Review, StorefrontApi,
};
use crate::error::add_breadcrumb;

/// Shown when a comment is submitted without content.
pub const COMMENT_CONTENT_REQUIRED: &str = "You need to enter some content to comment";
/// Shown when a review is submitted without a star rating.
pub const REVIEW_RATE_REQUIRED: &str = "You need to rate the product";
/// Shown when a review is submitted without content.
pub const REVIEW_CONTENT_REQUIRED: &str = "You need to enter some content to review the product";

/// Render-ready product page state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDetailState {
    /// `None` until the product has loaded.
    pub product: Option<Product>,
    /// `None` until the comments have loaded.
    pub comments: Option<Vec<Comment>>,
    /// `None` until the reviews have loaded.
    pub reviews: Option<Vec<Review>>,
    pub comment_content: String,
    pub comment_error: Option<String>,
    /// Selected stars, 0 when nothing is selected.
    pub review_rate: u8,
    pub review_content: String,
    pub review_error: Option<String>,
    /// Like state returned by the last toggle.
    pub like: Option<bool>,
    /// A comment or review submission is outstanding.
    pub busy: bool,
    /// The read-only "your review" dialog is open.
    pub review_modal_open: bool,
}

/// What the review section offers the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewPanel {
    /// Anonymous viewer: link to the login page.
    LoginPrompt,
    /// Signed-in viewer who has not reviewed the product yet.
    Form,
    /// Signed-in viewer's existing review, read-only.
    Submitted(AuthReview),
}

/// Product page controller.
pub struct ProductDetailView<A> {
    api: A,
    product_id: ProductId,
    state: watch::Sender<ProductDetailState>,
}

impl<A> std::fmt::Debug for ProductDetailView<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductDetailView")
            .field("product_id", &self.product_id)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<A: StorefrontApi> ProductDetailView<A> {
    /// Create a view for one product. Nothing is fetched until [`load`](Self::load).
    #[must_use]
    pub fn new(api: A, product_id: ProductId) -> Self {
        let (state, _) = watch::channel(ProductDetailState::default());
        Self {
            api,
            product_id,
            state,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> ProductDetailState {
        self.state.borrow().clone()
    }

    /// Watch the view state for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProductDetailState> {
        self.state.subscribe()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load the product, its comments and its reviews concurrently.
    ///
    /// Each part is applied as soon as it arrives; a failed part stays
    /// unloaded.
    ///
    /// # Errors
    ///
    /// Returns the first failure, in product, comments, reviews order.
    #[instrument(skip(self), fields(product_id = %self.product_id))]
    pub async fn load(&self) -> Result<(), ApiError> {
        let (product, comments, reviews) = tokio::join!(
            self.reload_product(),
            self.load_comments(),
            self.load_reviews()
        );
        product.and(comments).and(reviews)
    }

    /// Fetch the product again.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previously loaded product is kept.
    pub async fn reload_product(&self) -> Result<(), ApiError> {
        match self.api.product(self.product_id).await {
            Ok(product) => {
                self.state.send_modify(|s| s.product = Some(product));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, product_id = %self.product_id, "Failed to load product");
                Err(e)
            }
        }
    }

    /// Fetch the comment list.
    ///
    /// # Errors
    ///
    /// Returns the API error; the comment list is left as it was.
    pub async fn load_comments(&self) -> Result<(), ApiError> {
        match self.api.comments(self.product_id).await {
            Ok(comments) => {
                self.state.send_modify(|s| s.comments = Some(comments));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, product_id = %self.product_id, "Failed to load comments");
                Err(e)
            }
        }
    }

    /// Fetch the review list.
    ///
    /// # Errors
    ///
    /// Returns the API error; the review list is left as it was.
    pub async fn load_reviews(&self) -> Result<(), ApiError> {
        match self.api.reviews(self.product_id).await {
            Ok(reviews) => {
                self.state.send_modify(|s| s.reviews = Some(reviews));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, product_id = %self.product_id, "Failed to load reviews");
                Err(e)
            }
        }
    }

    /// Reload the product after a successful write.
    ///
    /// A failed reload is already logged by [`reload_product`](Self::reload_product)
    /// and leaves the previous product in place; the write itself stands.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.reload_product().await {
            tracing::debug!(error = %e, "Product not refreshed after write");
        }
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    pub fn set_comment_content(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.comment_content = value);
    }

    /// Select a star rating; 0 clears the selection.
    pub fn set_review_rate(&self, stars: u8) {
        self.state.send_modify(|s| s.review_rate = stars);
    }

    pub fn set_review_content(&self, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.review_content = value);
    }

    pub fn open_review_modal(&self) {
        self.state.send_modify(|s| s.review_modal_open = true);
    }

    pub fn close_review_modal(&self) {
        self.state.send_modify(|s| s.review_modal_open = false);
    }

    // =========================================================================
    // Derived State
    // =========================================================================

    /// Whether the like button shows as active.
    #[must_use]
    pub fn is_liked(&self) -> bool {
        let state = self.state.borrow();
        state.like == Some(true) || state.product.as_ref().is_some_and(|p| p.liked)
    }

    /// What the review section offers the viewer.
    #[must_use]
    pub fn review_panel(&self) -> ReviewPanel {
        review_panel(self.api.is_authenticated(), self.state.borrow().product.as_ref())
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Post the comment in the comment input.
    ///
    /// Empty content sets the comment error and sends nothing. On success the
    /// returned comment is prepended to the list and the input cleared.
    #[instrument(skip(self), fields(product_id = %self.product_id))]
    pub async fn add_comment(&self) -> ActionOutcome {
        if !self.api.is_authenticated() {
            return ActionOutcome::LoginRequired;
        }

        let content = self.state.borrow().comment_content.clone();
        if content.trim().is_empty() {
            self.state
                .send_modify(|s| s.comment_error = Some(COMMENT_CONTENT_REQUIRED.to_string()));
            return ActionOutcome::Invalid(COMMENT_CONTENT_REQUIRED.to_string());
        }

        if !try_begin(&self.state, |s| &mut s.busy) {
            return ActionOutcome::Busy;
        }

        let product_id = self.product_id.to_string();
        add_breadcrumb(
            "product",
            "Posted comment",
            Some(&[("product_id", product_id.as_str())]),
        );

        let outcome = match self
            .api
            .add_comment(self.product_id, &NewComment { content })
            .await
        {
            Ok(comment) => {
                self.state.send_modify(|s| {
                    s.comments.get_or_insert_with(Vec::new).insert(0, comment);
                    s.comment_content.clear();
                    s.comment_error = None;
                });
                ActionOutcome::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to post comment");
                ActionOutcome::Failed(e)
            }
        };

        self.state.send_modify(|s| s.busy = false);

        if outcome.is_completed() {
            self.refresh_after_write().await;
        }
        outcome
    }

    /// Post the review in the review inputs.
    ///
    /// Requires a rating of 1-5 stars and non-empty content; otherwise the
    /// review error is set and nothing is sent. On success the returned
    /// review is prepended and the inputs reset.
    #[instrument(skip(self), fields(product_id = %self.product_id))]
    pub async fn add_review(&self) -> ActionOutcome {
        match self.review_panel() {
            ReviewPanel::LoginPrompt => return ActionOutcome::LoginRequired,
            ReviewPanel::Submitted(_) => return ActionOutcome::AlreadyReviewed,
            ReviewPanel::Form => {}
        }

        let (stars, content) = {
            let state = self.state.borrow();
            (state.review_rate, state.review_content.clone())
        };

        let review = match validate_review(stars, content) {
            Ok(review) => review,
            Err(message) => {
                self.state
                    .send_modify(|s| s.review_error = Some(message.to_string()));
                return ActionOutcome::Invalid(message.to_string());
            }
        };

        if !try_begin(&self.state, |s| &mut s.busy) {
            return ActionOutcome::Busy;
        }

        let product_id = self.product_id.to_string();
        let rate = review.rate.to_string();
        add_breadcrumb(
            "product",
            "Posted review",
            Some(&[("product_id", product_id.as_str()), ("rate", rate.as_str())]),
        );

        let outcome = match self.api.add_review(self.product_id, &review).await {
            Ok(review) => {
                self.state.send_modify(|s| {
                    s.reviews.get_or_insert_with(Vec::new).insert(0, review);
                    s.review_rate = 0;
                    s.review_content.clear();
                    s.review_error = None;
                });
                ActionOutcome::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to post review");
                ActionOutcome::Failed(e)
            }
        };

        self.state.send_modify(|s| s.busy = false);

        if outcome.is_completed() {
            self.refresh_after_write().await;
        }
        outcome
    }

    /// Toggle the viewer's like.
    ///
    /// Independent of the busy flag. On HTTP 200 the returned like state is
    /// stored and the product reloaded.
    #[instrument(skip(self), fields(product_id = %self.product_id))]
    pub async fn toggle_like(&self) -> ActionOutcome {
        if !self.api.is_authenticated() {
            return ActionOutcome::LoginRequired;
        }

        match self.api.like_product(self.product_id).await {
            Ok(response) if response.status == StatusCode::OK => {
                let liked = response.data.is_liked();
                self.state.send_modify(|s| s.like = Some(liked));
                self.refresh_after_write().await;
                ActionOutcome::Completed
            }
            Ok(response) => {
                tracing::warn!(status = %response.status, "Like toggle returned unexpected status");
                ActionOutcome::Unexpected(response.status)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to toggle like");
                ActionOutcome::Failed(e)
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Build the page template for the current state.
    #[must_use]
    pub fn page(&self) -> ProductDetailPage {
        ProductDetailPage::new(
            &self.state(),
            self.review_panel(),
            self.is_liked(),
        )
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

/// Decide the review section for a viewer.
#[must_use]
pub fn review_panel(authenticated: bool, product: Option<&Product>) -> ReviewPanel {
    if !authenticated {
        return ReviewPanel::LoginPrompt;
    }
    product
        .and_then(Product::submitted_review)
        .map_or(ReviewPanel::Form, |review| {
            ReviewPanel::Submitted(review.clone())
        })
}

/// Check the review inputs, rating first.
///
/// # Errors
///
/// Returns the message to show when the rating or content is missing.
pub fn validate_review(stars: u8, content: String) -> Result<NewReview, &'static str> {
    let rate = Rating::new(stars).map_err(|_| REVIEW_RATE_REQUIRED)?;
    if content.trim().is_empty() {
        return Err(REVIEW_CONTENT_REQUIRED);
    }
    Ok(NewReview { rate, content })
}

// =============================================================================
// Templates
// =============================================================================

/// Star string such as "★★★☆☆".
fn stars(count: u8) -> String {
    let filled = usize::from(count.min(Rating::MAX));
    let empty = usize::from(Rating::MAX) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// Review display data.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub username: String,
    pub avatar: Option<String>,
    pub stars: String,
    pub content: String,
    pub reviewed_at: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            username: review.user.username.clone(),
            avatar: review.user.avatar.clone(),
            stars: stars(review.rate.map_or(0, Rating::stars)),
            content: review.content.clone(),
            reviewed_at: review.reviewed_at().format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Top-level comment display data.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub username: String,
    pub avatar: Option<String>,
    pub content: String,
    pub created_at: String,
    pub reply_count: usize,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            username: comment.user.username.clone(),
            avatar: comment.user.avatar.clone(),
            content: comment.content.clone(),
            created_at: comment.created_date.format("%Y-%m-%d %H:%M").to_string(),
            reply_count: comment.replies.len(),
        }
    }
}

/// The viewer's own review, shown read-only.
#[derive(Debug, Clone)]
pub struct MyReviewView {
    pub stars: String,
    pub content: String,
}

/// Product page template.
#[derive(Debug, Template)]
#[template(path = "product_detail.html")]
pub struct ProductDetailPage {
    pub product: Option<Product>,
    pub shop_url: String,
    pub avg_stars: String,
    pub liked: bool,
    pub login_prompt: bool,
    pub review_form: bool,
    pub my_review: Option<MyReviewView>,
    pub review_modal_open: bool,
    pub review_stars: String,
    pub review_content: String,
    pub review_error: Option<String>,
    pub comment_content: String,
    pub comment_error: Option<String>,
    pub busy: bool,
    pub reviews: Option<Vec<ReviewView>>,
    pub comments: Option<Vec<CommentView>>,
}

impl ProductDetailPage {
    fn new(state: &ProductDetailState, panel: ReviewPanel, liked: bool) -> Self {
        let (login_prompt, review_form, my_review) = match panel {
            ReviewPanel::LoginPrompt => (true, false, None),
            ReviewPanel::Form => (false, true, None),
            ReviewPanel::Submitted(review) => (
                false,
                false,
                Some(MyReviewView {
                    stars: stars(review.rate.unwrap_or_default()),
                    content: review.content.unwrap_or_default(),
                }),
            ),
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5
        let avg_stars = state
            .product
            .as_ref()
            .map(|p| stars(p.avg_rate.round().clamp(0.0, 5.0) as u8))
            .unwrap_or_default();

        Self {
            shop_url: state
                .product
                .as_ref()
                .map(|p| p.shop.products_path())
                .unwrap_or_default(),
            avg_stars,
            product: state.product.clone(),
            liked,
            login_prompt,
            review_form,
            my_review,
            review_modal_open: state.review_modal_open,
            review_stars: stars(state.review_rate),
            review_content: state.review_content.clone(),
            review_error: state.review_error.clone(),
            comment_content: state.comment_content.clone(),
            comment_error: state.comment_error.clone(),
            busy: state.busy,
            reviews: state
                .reviews
                .as_ref()
                .map(|reviews| reviews.iter().map(ReviewView::from).collect()),
            comments: state
                .comments
                .as_ref()
                .map(|comments| comments.iter().map(CommentView::from).collect()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(auth_review: serde_json::Value) -> Product {
        serde_json::from_value(json!({
            "id": 5,
            "name": "Lotus tea",
            "image": "https://cdn.example.com/tea.png",
            "price": 120000,
            "description": "<b>Fresh</b> leaves",
            "category": {"name": "Tea"},
            "tags": [{"id": 1, "name": "organic"}, {"id": 2, "name": "hanoi"}],
            "shop": {"id": 9, "name": "Hanoi Leaf"},
            "avg_rate": 4.4,
            "total_review": 2,
            "total_comment": 3,
            "liked": false,
            "auth_review": auth_review
        }))
        .unwrap()
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(9), "★★★★★");
    }

    #[test]
    fn test_review_panel() {
        let fresh = product(json!({"rate": null, "content": null}));
        let reviewed = product(json!({"rate": 4, "content": "Lovely"}));

        assert_eq!(review_panel(false, Some(&reviewed)), ReviewPanel::LoginPrompt);
        assert_eq!(review_panel(true, Some(&fresh)), ReviewPanel::Form);
        assert_eq!(review_panel(true, None), ReviewPanel::Form);
        assert!(matches!(
            review_panel(true, Some(&reviewed)),
            ReviewPanel::Submitted(AuthReview { rate: Some(4), .. })
        ));
    }

    #[test]
    fn test_validate_review_checks_rate_first() {
        assert_eq!(
            validate_review(0, String::new()).unwrap_err(),
            REVIEW_RATE_REQUIRED
        );
        assert_eq!(
            validate_review(6, "ok".to_string()).unwrap_err(),
            REVIEW_RATE_REQUIRED
        );
        assert_eq!(
            validate_review(4, "   ".to_string()).unwrap_err(),
            REVIEW_CONTENT_REQUIRED
        );

        let review = validate_review(4, "Lovely".to_string()).unwrap();
        assert_eq!(review.rate.stars(), 4);
        assert_eq!(review.content, "Lovely");
    }

    #[test]
    fn test_render_loading_without_product() {
        let page = ProductDetailPage::new(&ProductDetailState::default(), ReviewPanel::Form, false);
        let html = page.render().unwrap();
        assert!(html.contains("aria-busy=\"true\""));
        assert!(!html.contains("<h2"));
    }

    #[test]
    fn test_render_anonymous_shows_login_prompts() {
        let state = ProductDetailState {
            product: Some(product(json!(null))),
            reviews: Some(vec![]),
            comments: Some(vec![]),
            ..ProductDetailState::default()
        };
        let html = ProductDetailPage::new(&state, ReviewPanel::LoginPrompt, false)
            .render()
            .unwrap();

        assert_eq!(html.matches("href=\"/login\"").count(), 2);
        assert!(!html.contains("name=\"review_content\""));
        assert!(!html.contains("name=\"comment_content\""));
        assert!(html.contains("<b>Fresh</b> leaves"));
        assert!(html.contains("href=\"/shops/9/products\""));
        assert!(html.contains("btn-outline-danger"));
    }

    #[test]
    fn test_render_submitted_review_is_read_only() {
        let reviewed = product(json!({"rate": 4, "content": "Lovely"}));
        let state = ProductDetailState {
            product: Some(reviewed.clone()),
            review_modal_open: true,
            ..ProductDetailState::default()
        };
        let panel = review_panel(true, Some(&reviewed));
        let html = ProductDetailPage::new(&state, panel, true).render().unwrap();

        assert!(html.contains("<dialog open"));
        assert!(html.contains("readonly"));
        assert!(html.contains("Lovely"));
        assert!(!html.contains("name=\"review_content\""));
        assert!(html.contains("name=\"comment_content\""));
        assert!(html.contains("btn btn-danger"));
    }

    #[test]
    fn test_render_busy_hides_submit_buttons() {
        let state = ProductDetailState {
            product: Some(product(json!(null))),
            busy: true,
            ..ProductDetailState::default()
        };
        let html = ProductDetailPage::new(&state, ReviewPanel::Form, false)
            .render()
            .unwrap();
        assert!(html.contains("name=\"review_content\""));
        assert!(!html.contains("type=\"submit\""));
    }
}
