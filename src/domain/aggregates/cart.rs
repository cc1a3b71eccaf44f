//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{CartLineId, Money, MoneyError, Quantity, QuantityError, Size, UserId};

/// A user's cart as read from the store.
#[derive(Clone, Debug)]
pub struct Cart {
    user_id: UserId,
    currency: String,
    lines: Vec<CartLine>,
}

/// One (product, size) entry in a cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: Uuid,
    pub name: String,
    pub price: Money,
    pub quantity: Quantity,
    pub size: Size,
    pub image: String,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn new(product_id: Uuid, name: impl Into<String>, price: Money, size: Size, quantity: Quantity, image: impl Into<String>) -> Self {
        Self {
            id: CartLineId::for_line(product_id, &size),
            product_id, name: name.into(), price, quantity, size, image: image.into(), added_at: Utc::now(),
        }
    }

    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity.value()) }
}

/// Sum of price × quantity over `lines`; zero for an empty slice.
pub fn compute_subtotal(lines: &[CartLine], currency: &str) -> Result<Money, MoneyError> {
    lines.iter().try_fold(Money::zero(currency), |acc, line| acc.add(&line.line_total()))
}

impl Cart {
    pub fn new(user_id: UserId, currency: &str) -> Self {
        Self { user_id, currency: currency.to_string(), lines: vec![] }
    }

    pub fn from_lines(user_id: UserId, currency: &str, lines: Vec<CartLine>) -> Self {
        Self { user_id, currency: currency.to_string(), lines }
    }

    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn into_lines(self) -> Vec<CartLine> { self.lines }
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> { self.lines.iter().find(|l| &l.id == id) }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 { self.lines.iter().map(|l| l.quantity.value()).sum() }

    pub fn subtotal(&self) -> Result<Money, MoneyError> { compute_subtotal(&self.lines, &self.currency) }

    /// Inserts `line`, or adds its quantity to the line already holding the same key.
    /// A sum that no longer fits a quantity leaves the cart unchanged.
    pub fn add_line(&mut self, line: CartLine) -> Result<&CartLine, CartError> {
        let idx = match self.lines.iter().position(|l| l.id == line.id) {
            Some(idx) => {
                let existing = &mut self.lines[idx];
                existing.quantity = existing.quantity.checked_add(line.quantity)?;
                idx
            }
            None => {
                self.lines.push(line);
                self.lines.len() - 1
            }
        };
        Ok(&self.lines[idx])
    }

    pub fn set_quantity(&mut self, id: &CartLineId, quantity: Quantity) -> Result<&CartLine, CartError> {
        let line = self.lines.iter_mut().find(|l| &l.id == id).ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        Ok(line)
    }

    /// Returns whether a line was removed.
    pub fn remove_line(&mut self, id: &CartLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.id != id);
        self.lines.len() != before
    }

    /// Takes ordered lines out of the cart. Each line loses the ordered quantity and is
    /// dropped once nothing is left; lines added after the order was placed stay.
    pub fn remove_ordered(&mut self, items: &[CartLine]) {
        for item in items {
            if let Some(idx) = self.lines.iter().position(|l| l.id == item.id) {
                match self.lines[idx].quantity.checked_sub(item.quantity) {
                    Some(rest) => self.lines[idx].quantity = rest,
                    None => { self.lines.remove(idx); }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart line not found")]
    LineNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("the cart is empty")]
    Empty,
    #[error(transparent)]
    Quantity(#[from] QuantityError),
}
