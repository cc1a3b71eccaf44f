//! In-process store. Used when no `DATABASE_URL` is configured and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartRepository, OrderRepository, ProductRepository, ShippingRepository, StoreError, UserRepository};
use crate::domain::aggregates::{Cart, CartLine, Order, Product, Role, ShippingInfo, User};
use crate::domain::value_objects::{CartLineId, Quantity, UserId, DEFAULT_CURRENCY};

#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
    users: RwLock<HashMap<UserId, User>>,
    carts: RwLock<HashMap<UserId, Cart>>,
    shipping: RwLock<HashMap<UserId, ShippingInfo>>,
    orders: RwLock<HashMap<UserId, Vec<Order>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products.write().await.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool, StoreError> {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id() == product.id()) {
            Some(existing) => { *existing = product.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id() != id);
        Ok(products.len() != before)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().await.iter().find(|p| p.id() == id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.read().await.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn ensure_user(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        Ok(users.entry(user.uid.clone()).or_insert_with(|| user.clone()).clone())
    }

    async fn find_user(&self, uid: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn set_role(&self, uid: &UserId, role: Role) -> Result<bool, StoreError> {
        Ok(self.users.write().await.get_mut(uid).map(|u| u.role = role).is_some())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn cart_lines(&self, user: &UserId) -> Result<Vec<CartLine>, StoreError> {
        Ok(self.carts.read().await.get(user).map(|c| c.lines().to_vec()).unwrap_or_default())
    }

    async fn merge_line(&self, user: &UserId, line: &CartLine) -> Result<CartLine, StoreError> {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(user.clone()).or_insert_with(|| Cart::new(user.clone(), DEFAULT_CURRENCY));
        Ok(cart.add_line(line.clone())?.clone())
    }

    async fn set_line_quantity(&self, user: &UserId, id: &CartLineId, quantity: Quantity) -> Result<Option<CartLine>, StoreError> {
        let mut carts = self.carts.write().await;
        Ok(carts.get_mut(user).and_then(|c| c.set_quantity(id, quantity).ok().cloned()))
    }

    async fn remove_line(&self, user: &UserId, id: &CartLineId) -> Result<bool, StoreError> {
        Ok(self.carts.write().await.get_mut(user).is_some_and(|c| c.remove_line(id)))
    }

    async fn remove_ordered(&self, user: &UserId, items: &[CartLine]) -> Result<(), StoreError> {
        if let Some(cart) = self.carts.write().await.get_mut(user) { cart.remove_ordered(items); }
        Ok(())
    }
}

#[async_trait]
impl ShippingRepository for MemoryStore {
    async fn save_shipping(&self, user: &UserId, info: &ShippingInfo) -> Result<(), StoreError> {
        self.shipping.write().await.insert(user.clone(), info.clone());
        Ok(())
    }

    async fn find_shipping(&self, user: &UserId) -> Result<Option<ShippingInfo>, StoreError> {
        Ok(self.shipping.read().await.get(user).cloned())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.entry(order.user_id().clone()).or_default().push(order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(order.user_id())
            .and_then(|list| list.iter_mut().find(|o| o.id() == order.id()))
            .ok_or_else(|| StoreError::Corrupt(format!("order {} vanished", order.id())))?;
        *stored = order.clone();
        Ok(())
    }

    async fn find_order(&self, user: &UserId, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(user).and_then(|list| list.iter().find(|o| o.id() == id).cloned()))
    }

    async fn list_orders(&self, user: &UserId) -> Result<Vec<Order>, StoreError> {
        let mut list = self.orders.read().await.get(user).cloned().unwrap_or_default();
        list.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| b.id().cmp(&a.id())));
        Ok(list)
    }
}
