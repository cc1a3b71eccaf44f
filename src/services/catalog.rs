//! Product browsing.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::{Category, Product, ProductError};
use crate::error::{AppError, Result};
use crate::store::ProductRepository;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Store order.
    #[default]
    Popular,
    PriceLow,
    PriceHigh,
    Newest,
}

/// An empty category set matches every product.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub categories: HashSet<Category>,
    pub sort: SortOrder,
}

impl ProductFilter {
    /// Parses a comma separated category list such as `caps,shoes`.
    pub fn parse_categories(raw: &str) -> std::result::Result<HashSet<Category>, ProductError> {
        raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::parse::<Category>).collect()
    }

    fn matches(&self, product: &Product) -> bool {
        self.categories.is_empty() || product.category().is_some_and(|c| self.categories.contains(&c))
    }
}

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self { Self { products } }

    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.products.list_products().await?.into_iter().filter(|p| filter.matches(p)).collect();
        match filter.sort {
            SortOrder::Popular => {}
            SortOrder::PriceLow => products.sort_by_key(|p| p.price().amount()),
            SortOrder::PriceHigh => products.sort_by(|a, b| b.price().amount().cmp(&a.price().amount())),
            SortOrder::Newest => products.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id()))),
        }
        Ok(products)
    }

    pub async fn get(&self, id: Uuid) -> Result<Product> {
        self.products.find_product(id).await?.ok_or(AppError::NotFound("Product"))
    }
}
