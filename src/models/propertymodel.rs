use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "property_verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyVerificationStatus {
    Pending,
    Verified,
}

impl PropertyVerificationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PropertyVerificationStatus::Pending => "pending",
            PropertyVerificationStatus::Verified => "verified",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Verification summary embedded in a listing. Only the workflow engine
/// writes it, and only when a case completes with a score.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyVerification {
    #[sqlx(rename = "verification_status")]
    pub status: PropertyVerificationStatus,
    #[sqlx(rename = "verification_score")]
    pub score: i32,
    pub last_verified: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
}

impl Default for PropertyVerification {
    fn default() -> Self {
        PropertyVerification {
            status: PropertyVerificationStatus::Pending,
            score: 0,
            last_verified: None,
            verified_by: None,
        }
    }
}

/// Engagement counters. Incremented only, never decremented.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, Default, PartialEq)]
pub struct PropertyAnalytics {
    pub views: i64,
    pub shares: i64,
    pub inquiries: i64,
    pub favorites: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsCounter {
    Views,
    Shares,
    Inquiries,
    Favorites,
}

impl AnalyticsCounter {
    pub fn column(&self) -> &'static str {
        match self {
            AnalyticsCounter::Views => "views",
            AnalyticsCounter::Shares => "shares",
            AnalyticsCounter::Inquiries => "inquiries",
            AnalyticsCounter::Favorites => "favorites",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    #[serde(rename = "agent")]
    pub agent_id: Uuid,

    pub title: String,
    pub description: String,
    pub address: String,
    pub state: String,
    pub city: String,
    pub property_type: String,

    // Pricing
    pub price: i64,
    pub currency: String,

    // Specifications
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub size: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub images: Vec<String>,
    pub documents: Json<Vec<PropertyDocument>>,
    pub features: Vec<String>,

    #[sqlx(flatten)]
    pub verification: PropertyVerification,
    #[sqlx(flatten)]
    pub analytics: PropertyAnalytics,

    pub is_active: bool,
    pub is_premium: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Written to the listing when a verification case completes with a score.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationSummary {
    pub property_id: Uuid,
    pub score: i32,
    pub verified_by: Uuid,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertySort {
    #[default]
    CreatedAt,
    Price,
    Views,
}

impl PropertySort {
    pub fn column(&self) -> &'static str {
        match self {
            PropertySort::CreatedAt => "created_at",
            PropertySort::Price => "price",
            PropertySort::Views => "views",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertySearchFilters {
    pub active_only: bool,
    pub state: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub verification_status: Option<PropertyVerificationStatus>,
    pub search: Option<String>,
    pub agent_id: Option<Uuid>,
    pub sort_by: PropertySort,
    pub ascending: bool,
}
