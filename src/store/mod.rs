//! Persistence ports and their adapters.
//!
//! Each concern of the storefront gets its own repository trait. Services
//! only ever see `Arc<dyn ...>` handles bundled in [`Repositories`], so the
//! Postgres adapter and the in-memory adapter are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{CartError, CartLine, Order, Product, Role, ShippingInfo, User};
use crate::domain::value_objects::{CartLineId, Quantity, UserId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("stored document is malformed: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Cart(#[from] CartError),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Overwrites a product. Returns `false` when no such product exists.
    async fn update_product(&self, product: &Product) -> Result<bool, StoreError>;

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    /// All products in creation order.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts `user` unless the uid is already known; returns the stored record.
    async fn ensure_user(&self, user: &User) -> Result<User, StoreError>;

    async fn find_user(&self, uid: &UserId) -> Result<Option<User>, StoreError>;

    /// Returns `false` when the uid is unknown.
    async fn set_role(&self, uid: &UserId, role: Role) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn cart_lines(&self, user: &UserId) -> Result<Vec<CartLine>, StoreError>;

    /// Inserts `line`, or increments the quantity of the line with the same id.
    /// Must be atomic with respect to concurrent merges of the same line. A sum
    /// that overflows a quantity fails with [`CartError::Quantity`] and changes nothing.
    async fn merge_line(&self, user: &UserId, line: &CartLine) -> Result<CartLine, StoreError>;

    async fn set_line_quantity(&self, user: &UserId, id: &CartLineId, quantity: Quantity) -> Result<Option<CartLine>, StoreError>;

    async fn remove_line(&self, user: &UserId, id: &CartLineId) -> Result<bool, StoreError>;

    /// Deducts each ordered line's quantity from the cart, dropping lines that reach zero.
    async fn remove_ordered(&self, user: &UserId, items: &[CartLine]) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ShippingRepository: Send + Sync {
    async fn save_shipping(&self, user: &UserId, info: &ShippingInfo) -> Result<(), StoreError>;

    async fn find_shipping(&self, user: &UserId) -> Result<Option<ShippingInfo>, StoreError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn update_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_order(&self, user: &UserId, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// The user's orders, newest first.
    async fn list_orders(&self, user: &UserId) -> Result<Vec<Order>, StoreError>;
}

/// Every repository the services need.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub shipping: Arc<dyn ShippingRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    /// Uses one store for every concern.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ProductRepository + UserRepository + CartRepository + ShippingRepository + OrderRepository + 'static,
    {
        Self {
            products: store.clone(),
            users: store.clone(),
            carts: store.clone(),
            shipping: store.clone(),
            orders: store,
        }
    }
}
