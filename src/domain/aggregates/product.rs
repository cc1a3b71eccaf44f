//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::Money;
use crate::domain::events::{DomainEvent, ProductEvent};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    id: Uuid,
    name: String,
    price: Money,
    description: String,
    category: Option<Category>,
    image: String,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Storefront shelves a product can be filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category { MaleWear, WomenWear, Caps, Shoes }

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaleWear => "maleWear",
            Self::WomenWear => "womenWear",
            Self::Caps => "caps",
            Self::Shoes => "shoes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Category {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maleWear" => Ok(Self::MaleWear),
            "womenWear" => Ok(Self::WomenWear),
            "caps" => Ok(Self::Caps),
            "shoes" => Ok(Self::Shoes),
            other => Err(ProductError::UnknownCategory(other.to_string())),
        }
    }
}

/// Fields an admin may change after creation. `None` leaves a field as is.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub image: Option<String>,
}

impl Product {
    pub fn create(name: impl Into<String>, price: Money, image: impl Into<String>) -> Result<Self, ProductError> {
        let name = name.into().trim().to_string();
        if name.is_empty() { return Err(ProductError::MissingName); }
        if price.is_negative() { return Err(ProductError::NegativePrice); }
        let id = Uuid::now_v7();
        let now = Utc::now();
        let image = image.into();
        let mut product = Self {
            id, name: name.clone(), price, description: String::new(), category: None,
            images: vec![image.clone()], image, created_at: now, updated_at: now, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, name }));
        Ok(product)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = description.into(); self }
    pub fn with_category(mut self, category: Option<Category>) -> Self { self.category = category; self }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> &Money { &self.price }
    pub fn description(&self) -> &str { &self.description }
    pub fn category(&self) -> Option<Category> { self.category }
    pub fn image(&self) -> &str { &self.image }
    pub fn images(&self) -> &[String] { &self.images }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn apply(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() { return Err(ProductError::MissingName); }
            self.name = name;
        }
        if let Some(amount) = patch.price {
            let price = Money::new(amount, self.price.currency());
            if price.is_negative() { return Err(ProductError::NegativePrice); }
            self.price = price;
        }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(category) = patch.category { self.category = Some(category); }
        if let Some(image) = patch.image {
            if !self.images.contains(&image) { self.images.insert(0, image.clone()); }
            self.image = image;
        }
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Updated { product_id: self.id }));
        Ok(())
    }

    pub fn mark_deleted(&mut self) {
        self.raise_event(DomainEvent::Product(ProductEvent::Deleted { product_id: self.id }));
    }

    /// Rebuilds a product from stored columns.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid, name: String, price: Money, description: String, category: Option<Category>,
        image: String, images: Vec<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, name, price, description, category, image, images, created_at, updated_at, events: vec![] }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("product name is required")]
    MissingName,
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("an image file is required")]
    MissingImage,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_create() {
        let mut p = Product::create("Oversized Tee", Money::php(Decimal::new(1000, 0)), "http://img/tee.png").unwrap();
        assert_eq!(p.name(), "Oversized Tee");
        assert_eq!(p.images(), ["http://img/tee.png".to_string()]);
        assert!(matches!(p.take_events().as_slice(), [DomainEvent::Product(ProductEvent::Created { .. })]));
    }

    #[test]
    fn test_product_requires_name_and_price() {
        assert_eq!(Product::create("  ", Money::default(), "x").unwrap_err(), ProductError::MissingName);
        assert_eq!(Product::create("Cap", Money::php(Decimal::new(-1, 0)), "x").unwrap_err(), ProductError::NegativePrice);
    }

    #[test]
    fn test_patch() {
        let mut p = Product::create("Cap", Money::php(Decimal::new(300, 0)), "a").unwrap();
        p.apply(ProductPatch { name: Some("Updated Name".into()), image: Some("b".into()), ..Default::default() }).unwrap();
        assert_eq!(p.name(), "Updated Name");
        assert_eq!(p.image(), "b");
        assert_eq!(p.images(), ["b".to_string(), "a".to_string()]);
        assert_eq!(p.price().amount(), Decimal::new(300, 0));
    }

    #[test]
    fn test_category_strings() {
        assert_eq!("womenWear".parse::<Category>().unwrap(), Category::WomenWear);
        assert_eq!(serde_json::to_string(&Category::MaleWear).unwrap(), "\"maleWear\"");
        assert!("hats".parse::<Category>().is_err());
    }
}
