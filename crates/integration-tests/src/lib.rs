//! Integration tests for the Fuki storefront views.
//!
//! The views are driven end to end against [`FakeApi`], an in-memory
//! implementation of [`StorefrontApi`] that records every request and keeps
//! just enough server state (comments, reviews, likes) for reloads to see the
//! effect of earlier writes. Individual reads and all writes can be made to
//! fail with HTTP 500.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fuki-integration-tests
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use fuki_core::{CommentId, PaymentMethodId, Price, ProductId, ReviewId, ShopId};
use fuki_storefront::api::{
    ApiError, ApiResponse, AuthReview, Category, Comment, LikeStatus, NewComment, NewOrder,
    NewReview, PaymentMethod, Product, Review, Shop, StorefrontApi, UserSummary,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// A request received by [`FakeApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    PaymentMethods,
    Checkout(NewOrder),
    Product(ProductId),
    Comments(ProductId),
    AddComment(ProductId, NewComment),
    Reviews(ProductId),
    AddReview(ProductId, NewReview),
    Like(ProductId),
}

/// How the fake answers checkout requests.
#[derive(Debug, Clone)]
pub enum CheckoutReply {
    /// Succeed with this status and echo an order record.
    Status(StatusCode),
    /// Fail with HTTP 400 and this body.
    Reject(Value),
}

/// Read endpoints that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    PaymentMethods,
    Product,
    Comments,
    Reviews,
}

#[derive(Debug)]
struct FakeState {
    product: Product,
    comments: Vec<Comment>,
    reviews: Vec<Review>,
    payment_methods: Vec<PaymentMethod>,
    checkout: CheckoutReply,
    like_status: StatusCode,
    fail_writes: bool,
    failing_reads: Vec<Read>,
    next_id: i32,
    requests: Vec<Request>,
}

/// In-memory storefront API.
#[derive(Debug)]
pub struct FakeApi {
    authenticated: bool,
    state: Mutex<FakeState>,
}

impl FakeApi {
    /// A signed-in API serving [`sample_product`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            authenticated: true,
            state: Mutex::new(FakeState {
                product: sample_product(),
                comments: Vec::new(),
                reviews: Vec::new(),
                payment_methods: vec![
                    PaymentMethod {
                        id: PaymentMethodId::new(1),
                        name: "Cash on delivery".to_string(),
                    },
                    PaymentMethod {
                        id: PaymentMethodId::new(2),
                        name: "MoMo".to_string(),
                    },
                ],
                checkout: CheckoutReply::Status(StatusCode::CREATED),
                like_status: StatusCode::OK,
                fail_writes: false,
                failing_reads: Vec::new(),
                next_id: 100,
                requests: Vec::new(),
            }),
        }
    }

    /// The same API without a user credential.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the served product.
    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        self.lock().product = product;
        self
    }

    /// Seed the comment list.
    #[must_use]
    pub fn with_comments(self, comments: Vec<Comment>) -> Self {
        self.lock().comments = comments;
        self
    }

    /// Seed the review list.
    #[must_use]
    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        self.lock().reviews = reviews;
        self
    }

    /// Answer checkout requests with `reply`.
    #[must_use]
    pub fn with_checkout(self, reply: CheckoutReply) -> Self {
        self.lock().checkout = reply;
        self
    }

    /// Answer like toggles with `status`.
    #[must_use]
    pub fn with_like_status(self, status: StatusCode) -> Self {
        self.lock().like_status = status;
        self
    }

    /// Make every comment and review post fail with HTTP 500.
    #[must_use]
    pub fn failing_writes(self) -> Self {
        self.lock().fail_writes = true;
        self
    }

    /// Make one read endpoint fail with HTTP 500.
    #[must_use]
    pub fn failing_read(self, read: Read) -> Self {
        self.lock().failing_reads.push(read);
        self
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    /// Number of requests matching `pred`.
    pub fn count(&self, pred: impl Fn(&Request) -> bool) -> usize {
        self.lock().requests.iter().filter(|r| pred(r)).count()
    }

    fn record(&self, request: Request) -> MutexGuard<'_, FakeState> {
        let mut state = self.lock();
        state.requests.push(request);
        state
    }
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: json!({"detail": "Server error"}),
    }
}

fn tester() -> UserSummary {
    UserSummary {
        username: "tester".to_string(),
        avatar: None,
    }
}

impl StorefrontApi for FakeApi {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, ApiError> {
        tokio::task::yield_now().await;
        let state = self.record(Request::PaymentMethods);
        if state.failing_reads.contains(&Read::PaymentMethods) {
            return Err(server_error());
        }
        Ok(state.payment_methods.clone())
    }

    async fn checkout(&self, order: &NewOrder) -> Result<ApiResponse<Value>, ApiError> {
        tokio::task::yield_now().await;
        let state = self.record(Request::Checkout(order.clone()));
        match &state.checkout {
            CheckoutReply::Status(status) => Ok(ApiResponse::new(
                *status,
                json!({"id": 1, "receiver_name": order.receiver_name}),
            )),
            CheckoutReply::Reject(body) => Err(ApiError::Status {
                status: StatusCode::BAD_REQUEST,
                body: body.clone(),
            }),
        }
    }

    async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        tokio::task::yield_now().await;
        let state = self.record(Request::Product(id));
        if state.failing_reads.contains(&Read::Product) {
            return Err(server_error());
        }
        Ok(Product {
            id,
            ..state.product.clone()
        })
    }

    async fn comments(&self, id: ProductId) -> Result<Vec<Comment>, ApiError> {
        tokio::task::yield_now().await;
        let state = self.record(Request::Comments(id));
        if state.failing_reads.contains(&Read::Comments) {
            return Err(server_error());
        }
        Ok(state.comments.clone())
    }

    async fn add_comment(&self, id: ProductId, comment: &NewComment) -> Result<Comment, ApiError> {
        tokio::task::yield_now().await;
        let mut state = self.record(Request::AddComment(id, comment.clone()));
        if state.fail_writes {
            return Err(server_error());
        }

        state.next_id += 1;
        let created = Comment {
            id: CommentId::new(state.next_id),
            content: comment.content.clone(),
            user: tester(),
            created_date: fixed_timestamp(),
            reply_to: None,
            replies: Vec::new(),
        };
        state.comments.insert(0, created.clone());
        state.product.total_comment += 1;
        Ok(created)
    }

    async fn reviews(&self, id: ProductId) -> Result<Vec<Review>, ApiError> {
        tokio::task::yield_now().await;
        let state = self.record(Request::Reviews(id));
        if state.failing_reads.contains(&Read::Reviews) {
            return Err(server_error());
        }
        Ok(state.reviews.clone())
    }

    async fn add_review(&self, id: ProductId, review: &NewReview) -> Result<Review, ApiError> {
        tokio::task::yield_now().await;
        let mut state = self.record(Request::AddReview(id, review.clone()));
        if state.fail_writes {
            return Err(server_error());
        }

        state.next_id += 1;
        let created = Review {
            id: ReviewId::new(state.next_id),
            rate: Some(review.rate),
            content: review.content.clone(),
            user: tester(),
            created_date: fixed_timestamp(),
            updated_date: None,
        };
        state.reviews.insert(0, created.clone());
        state.product.total_review += 1;
        state.product.auth_review = Some(AuthReview {
            rate: Some(review.rate.stars()),
            content: Some(review.content.clone()),
        });
        Ok(created)
    }

    async fn like_product(&self, id: ProductId) -> Result<ApiResponse<LikeStatus>, ApiError> {
        tokio::task::yield_now().await;
        if !self.authenticated {
            return Err(ApiError::Unauthenticated);
        }

        let mut state = self.record(Request::Like(id));
        let status = state.like_status;
        if status == StatusCode::OK {
            state.product.liked = !state.product.liked;
        }
        Ok(ApiResponse::new(status, LikeStatus::Flag(state.product.liked)))
    }
}

/// Product served by a fresh [`FakeApi`].
#[must_use]
pub fn sample_product() -> Product {
    Product {
        id: ProductId::new(5),
        name: "Lotus tea".to_string(),
        image: Some("https://cdn.example.com/tea.png".to_string()),
        price: Price::from_units(120_000),
        description: "<p>Hand-picked in Hanoi</p>".to_string(),
        category: Category {
            id: None,
            name: "Tea".to_string(),
        },
        tags: Vec::new(),
        shop: Shop {
            id: ShopId::new(9),
            name: "Hanoi Leaf".to_string(),
        },
        avg_rate: 4.0,
        total_review: 0,
        total_comment: 0,
        liked: false,
        auth_review: None,
    }
}

/// Stable creation time for fake records.
fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}
