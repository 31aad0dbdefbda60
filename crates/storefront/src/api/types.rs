//! Domain types for the storefront REST API.
//!
//! Field names follow the API's JSON (snake case), so most types derive
//! serde directly without renames.

use chrono::{DateTime, Utc};
use fuki_core::{
    CategoryId, CommentId, PaymentMethodId, Price, ProductId, Rating, ReviewId, ShopId, TagId,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the field type's default.
///
/// The API sends `null` for counters and averages of products nobody has
/// reviewed or commented on yet.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Deserialize a stored star rating; values outside 1-5 read as unrated.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<Rating>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|stars| u8::try_from(stars).ok())
        .and_then(|stars| Rating::new(stars).ok()))
}

// =============================================================================
// Catalogue Types
// =============================================================================

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID (absent in some product payloads).
    #[serde(default)]
    pub id: Option<CategoryId>,
    /// Display name.
    pub name: String,
}

/// Tag attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Shop selling a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
}

impl Shop {
    /// Storefront path listing this shop's products.
    #[must_use]
    pub fn products_path(&self) -> String {
        format!("/shops/{}/products", self.id)
    }
}

/// The signed-in user's own review of a product, as embedded in the product.
///
/// Both fields are empty when the user has not reviewed the product yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReview {
    #[serde(default)]
    pub rate: Option<u8>,
    #[serde(default)]
    pub content: Option<String>,
}

impl AuthReview {
    /// Whether this holds a complete, submitted review.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.rate.is_some_and(|rate| rate > 0)
            && self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Product detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Price,
    /// HTML description, rendered unescaped.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub category: Category,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    pub shop: Shop,
    /// Average star rating; 0 until the product is reviewed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_review: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_comment: u32,
    /// Whether the signed-in user likes this product.
    #[serde(default, deserialize_with = "null_as_default")]
    pub liked: bool,
    #[serde(default)]
    pub auth_review: Option<AuthReview>,
}

impl Product {
    /// The signed-in user's submitted review, if any.
    #[must_use]
    pub fn submitted_review(&self) -> Option<&AuthReview> {
        self.auth_review.as_ref().filter(|r| r.is_submitted())
    }
}

/// Payment method offered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
}

// =============================================================================
// Social Types
// =============================================================================

/// Author summary attached to reviews and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    /// `None` when the stored rating is missing or out of range.
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rate: Option<Rating>,
    pub content: String,
    pub user: UserSummary,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub updated_date: Option<DateTime<Utc>>,
}

impl Review {
    /// Timestamp shown next to the review: last edit, else creation.
    #[must_use]
    pub fn reviewed_at(&self) -> DateTime<Utc> {
        self.updated_date.unwrap_or(self.created_date)
    }
}

/// Product comment with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub user: UserSummary,
    pub created_date: DateTime<Utc>,
    /// Parent comment when this is a reply.
    #[serde(default)]
    pub reply_to: Option<CommentId>,
    #[serde(default)]
    pub replies: Vec<Self>,
}

/// Like state returned by the like endpoint.
///
/// The API answers either with a bare boolean or with the like record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LikeStatus {
    Flag(bool),
    Record {
        #[serde(alias = "active")]
        liked: bool,
    },
}

impl LikeStatus {
    /// Whether the product is liked after the toggle.
    #[must_use]
    pub const fn is_liked(self) -> bool {
        match self {
            Self::Flag(liked) | Self::Record { liked } => liked,
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// One order line of a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub product: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
}

/// Checkout request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    /// Selected payment method ID, as chosen in the form.
    pub payment_method: String,
    pub order_details: Vec<OrderDetail>,
}

/// Comment creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
}

/// Review creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub rate: Rating,
    pub content: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_json() -> serde_json::Value {
        json!({
            "id": 5,
            "name": "Lotus tea",
            "image": "https://cdn.example.com/tea.png",
            "price": 120000,
            "description": "<b>Fresh</b>",
            "category": {"name": "Tea"},
            "tags": [{"id": 1, "name": "organic"}],
            "shop": {"id": 9, "name": "Hanoi Leaf"},
            "avg_rate": 4.5,
            "total_review": 2,
            "total_comment": 3,
            "liked": false,
            "auth_review": {"rate": null, "content": null}
        })
    }

    #[test]
    fn test_product_deserialize() {
        let product: Product = serde_json::from_value(product_json()).unwrap();
        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(product.price, Price::from_units(120_000));
        assert_eq!(product.tags.len(), 1);
        assert_eq!(product.shop.products_path(), "/shops/9/products");
        assert!(product.submitted_review().is_none());
    }

    #[test]
    fn test_product_with_submitted_review() {
        let mut value = product_json();
        value["auth_review"] = json!({"rate": 4, "content": "Lovely"});
        let product: Product = serde_json::from_value(value).unwrap();
        let review = product.submitted_review().unwrap();
        assert_eq!(review.rate, Some(4));
    }

    #[test]
    fn test_auth_review_requires_rate_and_content() {
        let missing_content = AuthReview {
            rate: Some(3),
            content: Some(String::new()),
        };
        let missing_rate = AuthReview {
            rate: None,
            content: Some("ok".to_string()),
        };
        assert!(!missing_content.is_submitted());
        assert!(!missing_rate.is_submitted());
    }

    #[test]
    fn test_null_auth_review_is_accepted() {
        let mut value = product_json();
        value["auth_review"] = serde_json::Value::Null;
        let product: Product = serde_json::from_value(value).unwrap();
        assert!(product.auth_review.is_none());
    }

    #[test]
    fn test_review_prefers_updated_date() {
        let review: Review = serde_json::from_value(json!({
            "id": 1,
            "rate": 5,
            "content": "Great",
            "user": {"username": "lan", "avatar": null},
            "created_date": "2024-01-01T08:00:00Z",
            "updated_date": "2024-02-01T08:00:00+07:00"
        }))
        .unwrap();
        assert_eq!(review.reviewed_at(), review.updated_date.unwrap());
    }

    #[test]
    fn test_unreviewed_product_with_null_counters() {
        let mut value = product_json();
        value["avg_rate"] = serde_json::Value::Null;
        value["total_review"] = serde_json::Value::Null;
        value["total_comment"] = serde_json::Value::Null;
        value["description"] = serde_json::Value::Null;
        value["tags"] = serde_json::Value::Null;
        value["liked"] = serde_json::Value::Null;

        let product: Product = serde_json::from_value(value).unwrap();
        assert!(product.avg_rate.abs() < f64::EPSILON);
        assert_eq!(product.total_review, 0);
        assert_eq!(product.total_comment, 0);
        assert!(product.description.is_empty());
        assert!(product.tags.is_empty());
        assert!(!product.liked);
    }

    #[test]
    fn test_review_with_out_of_range_rate_still_parses() {
        let reviews: Vec<Review> = serde_json::from_value(json!([
            {
                "id": 1,
                "rate": 9,
                "content": "Imported from the old shop",
                "user": {"username": "lan"},
                "created_date": "2024-01-01T08:00:00Z"
            },
            {
                "id": 2,
                "rate": null,
                "content": "No stars",
                "user": {"username": "minh"},
                "created_date": "2024-01-02T08:00:00Z"
            },
            {
                "id": 3,
                "rate": 4,
                "content": "Good",
                "user": {"username": "hoa"},
                "created_date": "2024-01-03T08:00:00Z"
            }
        ]))
        .unwrap();

        assert_eq!(reviews.len(), 3);
        assert_eq!(reviews[0].rate, None);
        assert_eq!(reviews[1].rate, None);
        assert_eq!(reviews[2].rate.map(Rating::stars), Some(4));
    }

    #[test]
    fn test_comment_with_replies() {
        let comment: Comment = serde_json::from_value(json!({
            "id": 1,
            "content": "Is it sweet?",
            "user": {"username": "minh"},
            "created_date": "2024-01-01T08:00:00Z",
            "replies": [{
                "id": 2,
                "content": "A little",
                "user": {"username": "shop"},
                "created_date": "2024-01-01T09:00:00Z",
                "reply_to": 1
            }]
        }))
        .unwrap();
        assert_eq!(comment.replies.len(), 1);
        assert_eq!(comment.replies[0].reply_to, Some(CommentId::new(1)));
    }

    #[test]
    fn test_like_status_shapes() {
        let flag: LikeStatus = serde_json::from_value(json!(true)).unwrap();
        let record: LikeStatus = serde_json::from_value(json!({"active": false})).unwrap();
        assert!(flag.is_liked());
        assert!(!record.is_liked());
    }
}
