//! Write inputs for catalog entities.
//!
//! `New*` types carry everything a create needs. `*Patch` types carry only the
//! fields a caller wants changed; `None` leaves the stored value untouched.

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub logo: String,
}

impl NewCategory {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            name: required_text(self.name, "name")?,
            logo: required_text(self.logo, "logo")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub logo: Option<String>,
}

impl CategoryPatch {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            name: self.name.map(|v| required_text(v, "name")).transpose()?,
            logo: self.logo.map(|v| required_text(v, "logo")).transpose()?,
        })
    }
}

/// A variant declared inline while creating its product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVariant {
    pub color: String,
    pub size: String,
    pub stock: i32,
}

impl NewVariant {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            color: required_text(self.color, "color")?,
            size: required_text(self.size, "size")?,
            stock: valid_stock(self.stock)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub image_url: String,
    pub active: bool,
    pub category_id: i64,
    pub variants: Vec<NewVariant>,
}

impl NewProduct {
    pub fn validate(self) -> Result<Self, DomainError> {
        let variants = self
            .variants
            .into_iter()
            .map(NewVariant::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: required_text(self.name, "name")?,
            description: required_text(self.description, "description")?,
            price: valid_price(self.price, "price")?,
            sale_price: self
                .sale_price
                .map(|v| valid_price(v, "sale_price"))
                .transpose()?,
            image_url: required_text(self.image_url, "image_url")?,
            active: self.active,
            category_id: self.category_id,
            variants,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// `Some(None)` clears the sale price.
    pub sale_price: Option<Option<f64>>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
    pub category_id: Option<i64>,
}

impl ProductPatch {
    pub fn validate(self) -> Result<Self, DomainError> {
        let sale_price = match self.sale_price {
            Some(Some(value)) => Some(Some(valid_price(value, "sale_price")?)),
            other => other,
        };

        Ok(Self {
            name: self.name.map(|v| required_text(v, "name")).transpose()?,
            description: self
                .description
                .map(|v| required_text(v, "description"))
                .transpose()?,
            price: self.price.map(|v| valid_price(v, "price")).transpose()?,
            sale_price,
            image_url: self
                .image_url
                .map(|v| required_text(v, "image_url"))
                .transpose()?,
            active: self.active,
            category_id: self.category_id,
        })
    }
}

/// A variant created on its own against an existing product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductVariant {
    pub product_id: i64,
    pub color: String,
    pub size: String,
    pub stock: i32,
}

impl NewProductVariant {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            product_id: self.product_id,
            color: required_text(self.color, "color")?,
            size: required_text(self.size, "size")?,
            stock: valid_stock(self.stock)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantPatch {
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: Option<i32>,
}

impl VariantPatch {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            color: self.color.map(|v| required_text(v, "color")).transpose()?,
            size: self.size.map(|v| required_text(v, "size")).transpose()?,
            stock: self.stock.map(valid_stock).transpose()?,
        })
    }
}

fn required_text(value: String, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn valid_stock(stock: i32) -> Result<i32, DomainError> {
    if stock < 0 {
        return Err(DomainError::validation("stock", "must be 0 or greater"));
    }
    Ok(stock)
}

fn valid_price(price: f64, field: &'static str) -> Result<f64, DomainError> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation(
            field,
            "must be a finite, non-negative amount",
        ));
    }
    Ok(price)
}
