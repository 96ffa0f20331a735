// dtos/propertydtos.rs
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::Pagination;
use crate::models::propertymodel::{
    Property, PropertyAnalytics, PropertyDocument, PropertySearchFilters, PropertySort,
    PropertyVerification, PropertyVerificationStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    //Location
    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 2, max = 100, message = "State is required"))]
    pub state: String,

    #[validate(length(min = 2, max = 100, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, message = "Property type is required"))]
    pub property_type: String,

    //Pricing
    #[validate(range(min = 0, message = "Price must be a positive number"))]
    pub price: i64,
    pub currency: Option<String>,

    //Specifications
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    pub size: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub images: Option<Vec<String>>,
    pub documents: Option<Vec<PropertyDocument>>,
    pub features: Option<Vec<String>>,
    pub is_premium: Option<bool>,
}

impl CreatePropertyDto {
    /// New listings start unverified with zeroed counters.
    pub fn into_property(self, agent_id: Uuid) -> Property {
        let now = Utc::now();
        Property {
            id: Uuid::new_v4(),
            agent_id,
            title: self.title.trim().to_string(),
            description: self.description,
            address: self.address,
            state: self.state,
            city: self.city,
            property_type: self.property_type,
            price: self.price,
            currency: self.currency.unwrap_or_else(|| "NGN".to_string()),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            size: self.size,
            latitude: self.latitude,
            longitude: self.longitude,
            images: self.images.unwrap_or_default(),
            documents: Json(self.documents.unwrap_or_default()),
            features: self.features.unwrap_or_default(),
            verification: PropertyVerification::default(),
            analytics: PropertyAnalytics::default(),
            is_active: true,
            is_premium: self.is_premium.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. Verification summary and analytics are not writable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyDto {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1))]
    pub property_type: Option<String>,
    #[validate(range(min = 0, message = "Price must be a positive number"))]
    pub price: Option<i64>,
    pub currency: Option<String>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    pub size: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub documents: Option<Vec<PropertyDocument>>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_premium: Option<bool>,
}

impl UpdatePropertyDto {
    pub fn apply_to(self, property: &mut Property) {
        if let Some(title) = self.title {
            property.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            property.description = description;
        }
        if let Some(address) = self.address {
            property.address = address;
        }
        if let Some(state) = self.state {
            property.state = state;
        }
        if let Some(city) = self.city {
            property.city = city;
        }
        if let Some(property_type) = self.property_type {
            property.property_type = property_type;
        }
        if let Some(price) = self.price {
            property.price = price;
        }
        if let Some(currency) = self.currency {
            property.currency = currency;
        }
        if self.bedrooms.is_some() {
            property.bedrooms = self.bedrooms;
        }
        if self.bathrooms.is_some() {
            property.bathrooms = self.bathrooms;
        }
        if self.size.is_some() {
            property.size = self.size;
        }
        if self.latitude.is_some() {
            property.latitude = self.latitude;
        }
        if self.longitude.is_some() {
            property.longitude = self.longitude;
        }
        if let Some(documents) = self.documents {
            property.documents = Json(documents);
        }
        if let Some(features) = self.features {
            property.features = features;
        }
        if let Some(is_active) = self.is_active {
            property.is_active = is_active;
        }
        if let Some(is_premium) = self.is_premium {
            property.is_premium = is_premium;
        }
        property.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    #[validate(range(min = 0))]
    pub min_price: Option<i64>,
    #[validate(range(min = 0))]
    pub max_price: Option<i64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub verified: Option<bool>,
    pub search: Option<String>,
    pub agent: Option<Uuid>,
    pub sort_by: Option<PropertySort>,
    pub sort_order: Option<SortOrder>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PropertyQueryDto {
    /// Public search only ever sees active listings.
    pub fn into_filters(self) -> PropertySearchFilters {
        PropertySearchFilters {
            active_only: true,
            state: non_blank(self.state),
            city: non_blank(self.city),
            property_type: non_blank(self.property_type),
            min_price: self.min_price,
            max_price: self.max_price,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            verification_status: self
                .verified
                .filter(|verified| *verified)
                .map(|_| PropertyVerificationStatus::Verified),
            search: non_blank(self.search),
            agent_id: self.agent,
            sort_by: self.sort_by.unwrap_or_default(),
            ascending: self.sort_order.unwrap_or_default() == SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddImagesDto {
    #[validate(length(min = 1, message = "At least one image is required"))]
    pub images: Vec<String>,
}

impl AddImagesDto {
    pub fn cleaned(self) -> Vec<String> {
        self.images
            .into_iter()
            .map(|image| image.trim().to_string())
            .filter(|image| !image.is_empty())
            .collect()
    }
}

/// Removes every stored image whose URL equals `url` or ends with `filename`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveImageDto {
    pub filename: Option<String>,
    pub url: Option<String>,
}

impl RemoveImageDto {
    pub fn matches(&self, image: &str) -> bool {
        let by_url = self.url.as_deref().is_some_and(|url| image == url);
        let by_name = self
            .filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .is_some_and(|name| image.ends_with(name));
        by_url || by_name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkDto {
    pub share_url: String,
    pub title: String,
    pub description: String,
}

const SHARE_DESCRIPTION_CHARS: usize = 150;

impl ShareLinkDto {
    pub fn new(frontend_url: &str, property_id: Uuid, title: &str, description: &str) -> Self {
        let description = if description.chars().count() > SHARE_DESCRIPTION_CHARS {
            let cut: String = description.chars().take(SHARE_DESCRIPTION_CHARS).collect();
            format!("{}...", cut)
        } else {
            description.to_string()
        };

        ShareLinkDto {
            share_url: format!(
                "{}/property/{}",
                frontend_url.trim_end_matches('/'),
                property_id
            ),
            title: title.to_string(),
            description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PropertyListDto {
    pub properties: Vec<Property>,
    pub pagination: Pagination,
}
