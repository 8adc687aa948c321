//! Output representations of persisted catalog rows.
//!
//! These are the shapes handed to callers and stored in the cache. Nested
//! relations are inlined so a cached entry can be served without touching
//! the database.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub id: i64,
    pub color: String,
    pub size: String,
    pub stock: i32,
    pub sku: String,
    pub product_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub image_url: String,
    pub active: bool,
    pub category: Option<CategoryRecord>,
    /// Ordered by variant id.
    pub variants: Vec<VariantRecord>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl ProductRecord {
    pub fn category_id(&self) -> Option<i64> {
        self.category.as_ref().map(|category| category.id)
    }

    pub fn variant_ids(&self) -> Vec<i64> {
        self.variants.iter().map(|variant| variant.id).collect()
    }
}
