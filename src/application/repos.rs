//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CategoryRecord, ProductRecord, VariantRecord};

/// Unique constraint names declared by the schema.
pub mod constraints {
    pub const CATEGORY_NAME: &str = "categories_name_key";
    pub const PRODUCT_NAME: &str = "products_name_key";
    pub const VARIANT_SKU: &str = "variants_sku_key";
    pub const VARIANT_COMBINATION: &str = "variants_product_color_size_key";
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn is_duplicate_of(&self, name: &str) -> bool {
        matches!(self, Self::Duplicate { constraint } if constraint == name)
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryParams {
    pub id: i64,
    pub name: String,
    pub logo: String,
}

/// A committed category update and the products that embed the category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUpdate {
    pub category: CategoryRecord,
    pub product_ids: Vec<i64>,
}

/// Rows removed by the store's cascading foreign keys when a category goes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCascade {
    pub product_ids: Vec<i64>,
    pub variant_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewVariantParams {
    pub color: String,
    pub size: String,
    pub stock: i32,
}

/// Product creation; the adapter generates a SKU for every nested variant
/// once the product id is known and inserts everything in one transaction.
#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub image_url: String,
    pub active: bool,
    pub category_id: i64,
    pub variants: Vec<NewVariantParams>,
}

#[derive(Debug, Clone)]
pub struct UpdateProductParams {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub image_url: String,
    pub active: bool,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct CreateVariantParams {
    pub product_id: i64,
    pub color: String,
    pub size: String,
    pub stock: i32,
    pub sku: String,
}

#[derive(Debug, Clone)]
pub struct UpdateVariantParams {
    pub id: i64,
    pub color: String,
    pub size: String,
    pub stock: i32,
    pub sku: String,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;

    async fn find_category_by_name(&self, name: &str)
    -> Result<Option<CategoryRecord>, RepoError>;

    /// Case-insensitive substring match on name, ascending by name.
    async fn search_categories(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    /// Returns the updated row together with the ids of its products, read in
    /// the same transaction.
    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryUpdate, RepoError>;

    async fn delete_category(&self, id: i64) -> Result<CategoryCascade, RepoError>;
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError>;

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError>;

    async fn find_product_by_name(&self, name: &str) -> Result<Option<ProductRecord>, RepoError>;

    /// Case-insensitive substring match on name, ascending by name.
    async fn search_products(&self, term: &str, limit: u32)
    -> Result<Vec<ProductRecord>, RepoError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    async fn create_product(&self, params: CreateProductParams)
    -> Result<ProductRecord, RepoError>;

    async fn update_product(&self, params: UpdateProductParams)
    -> Result<ProductRecord, RepoError>;

    /// Returns the ids of the variants removed along with the product.
    async fn delete_product(&self, id: i64) -> Result<Vec<i64>, RepoError>;
}

#[async_trait]
pub trait VariantsRepo: Send + Sync {
    async fn list_variants(&self) -> Result<Vec<VariantRecord>, RepoError>;

    async fn find_variant(&self, id: i64) -> Result<Option<VariantRecord>, RepoError>;

    async fn find_variant_by_combination(
        &self,
        product_id: i64,
        color: &str,
        size: &str,
    ) -> Result<Option<VariantRecord>, RepoError>;

    /// Case-insensitive substring match on SKU, ascending by SKU.
    async fn search_variants(&self, term: &str, limit: u32)
    -> Result<Vec<VariantRecord>, RepoError>;
}

#[async_trait]
pub trait VariantsWriteRepo: Send + Sync {
    async fn create_variant(&self, params: CreateVariantParams)
    -> Result<VariantRecord, RepoError>;

    async fn update_variant(&self, params: UpdateVariantParams)
    -> Result<VariantRecord, RepoError>;

    async fn delete_variant(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
