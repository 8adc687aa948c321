use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::commands::{
    CategoryPatch, NewCategory, NewProduct, NewProductVariant, NewVariant, ProductPatch,
    VariantPatch,
};

fn default_active() -> bool {
    true
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryCreateRequest {
    pub name: String,
    pub logo: String,
}

impl From<CategoryCreateRequest> for NewCategory {
    fn from(request: CategoryCreateRequest) -> Self {
        Self {
            name: request.name,
            logo: request.logo,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryUpdateRequest {
    pub name: Option<String>,
    pub logo: Option<String>,
}

impl From<CategoryUpdateRequest> for CategoryPatch {
    fn from(request: CategoryUpdateRequest) -> Self {
        Self {
            name: request.name,
            logo: request.logo,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VariantInlineRequest {
    pub color: String,
    pub size: String,
    pub stock: i32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ProductCreateRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub sale_price: Option<f64>,
    pub image_url: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub category_id: i64,
    #[serde(default)]
    pub variants: Vec<VariantInlineRequest>,
}

impl From<ProductCreateRequest> for NewProduct {
    fn from(request: ProductCreateRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
            sale_price: request.sale_price,
            image_url: request.image_url,
            active: request.active,
            category_id: request.category_id,
            variants: request
                .variants
                .into_iter()
                .map(|variant| NewVariant {
                    color: variant.color,
                    size: variant.size,
                    stock: variant.stock,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(deserialize_with = "deserialize_some")]
    pub sale_price: Option<Option<f64>>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
    pub category_id: Option<i64>,
}

impl From<ProductUpdateRequest> for ProductPatch {
    fn from(request: ProductUpdateRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
            sale_price: request.sale_price,
            image_url: request.image_url,
            active: request.active,
            category_id: request.category_id,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VariantCreateRequest {
    pub product_id: i64,
    pub color: String,
    pub size: String,
    pub stock: i32,
}

impl From<VariantCreateRequest> for NewProductVariant {
    fn from(request: VariantCreateRequest) -> Self {
        Self {
            product_id: request.product_id,
            color: request.color,
            size: request.size,
            stock: request.stock,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VariantUpdateRequest {
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: Option<i32>,
}

impl From<VariantUpdateRequest> for VariantPatch {
    fn from(request: VariantUpdateRequest) -> Self {
        Self {
            color: request.color,
            size: request.size,
            stock: request.stock,
        }
    }
}
