//! Cart workflow.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CartError, CartLine};
use crate::domain::value_objects::{CartLineId, Money, Quantity, Size};
use crate::error::Result;
use crate::session::Session;
use crate::store::{CartRepository, ProductRepository};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Money,
    pub subtotal_display: String,
}

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    currency: String,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, products: Arc<dyn ProductRepository>, currency: impl Into<String>) -> Self {
        Self { carts, products, currency: currency.into() }
    }

    /// Adds `quantity` of `product_id` in `size`, merging with an existing line for the same pair.
    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn add_to_cart(&self, session: &Session, product_id: Uuid, size: &str, quantity: i64) -> Result<CartLine> {
        let size = Size::new(size)?;
        let quantity = Quantity::try_from(quantity)?;
        let product = self.products.find_product(product_id).await?.ok_or(CartError::ProductNotFound)?;
        let line = CartLine::new(product.id(), product.name(), product.price().clone(), size, quantity, product.image());
        let stored = self.carts.merge_line(session.uid(), &line).await?;
        info!(line = %stored.id, quantity = %stored.quantity, "Added to cart");
        Ok(stored)
    }

    /// Overwrites a line's quantity. Values below one are rejected and leave the line untouched.
    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn update_quantity(&self, session: &Session, line_id: &CartLineId, new_quantity: i64) -> Result<CartLine> {
        let quantity = Quantity::try_from(new_quantity).map_err(|e| {
            warn!(line = %line_id, new_quantity, "Rejected cart quantity");
            e
        })?;
        let line = self.carts.set_line_quantity(session.uid(), line_id, quantity).await?.ok_or(CartError::LineNotFound)?;
        Ok(line)
    }

    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn remove_line(&self, session: &Session, line_id: &CartLineId) -> Result<()> {
        if self.carts.remove_line(session.uid(), line_id).await? {
            info!(line = %line_id, "Removed cart line");
        }
        Ok(())
    }

    pub async fn lines(&self, session: &Session) -> Result<Vec<CartLine>> {
        Ok(self.carts.cart_lines(session.uid()).await?)
    }

    pub async fn summary(&self, session: &Session) -> Result<CartSummary> {
        let cart = Cart::from_lines(session.uid().clone(), &self.currency, self.lines(session).await?);
        let subtotal = cart.subtotal()?;
        Ok(CartSummary { item_count: cart.item_count(), subtotal_display: subtotal.to_string(), subtotal, lines: cart.into_lines() })
    }
}
