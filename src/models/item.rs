//! Lendable item model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Item model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Opaque reference into the photo storage
    pub image_url: Option<String>,
    pub owner_id: i32,
    pub neighborhood_id: i32,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id == user_id
    }
}

/// Create item request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description is limited to 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub neighborhood_id: i32,
}

/// Update item request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description is limited to 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Item query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ItemQuery {
    pub neighborhood_id: Option<i32>,
    pub owner_id: Option<i32>,
    pub category: Option<String>,
}

impl ItemQuery {
    pub fn matches(&self, item: &Item) -> bool {
        self.neighborhood_id.map_or(true, |id| item.neighborhood_id == id)
            && self.owner_id.map_or(true, |id| item.owner_id == id)
            && self
                .category
                .as_ref()
                .map_or(true, |c| item.category.as_deref() == Some(c.as_str()))
    }
}
