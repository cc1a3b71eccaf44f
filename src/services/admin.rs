//! Product management and order collection for admins.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::{Category, Order, OrderError, Product, ProductError, ProductPatch, Role};
use crate::domain::value_objects::{Money, UserId};
use crate::error::{AppError, Result};
use crate::media::{ImageUpload, MediaStore};
use crate::publisher::{publish_all, EventPublisher};
use crate::session::Session;
use crate::store::{OrderRepository, ProductRepository, UserRepository};

/// Form fields of a new product. The image travels separately.
#[derive(Clone, Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    pub category: Option<Category>,
}

#[derive(Clone)]
pub struct AdminService {
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    orders: Arc<dyn OrderRepository>,
    media: Arc<dyn MediaStore>,
    publisher: Arc<dyn EventPublisher>,
    currency: String,
}

impl AdminService {
    pub fn new(
        products: Arc<dyn ProductRepository>, users: Arc<dyn UserRepository>, orders: Arc<dyn OrderRepository>,
        media: Arc<dyn MediaStore>, publisher: Arc<dyn EventPublisher>, currency: impl Into<String>,
    ) -> Self {
        Self { products, users, orders, media, publisher, currency: currency.into() }
    }

    /// Uploads the image, then writes the product. Nothing is uploaded when the fields are invalid.
    #[instrument(skip(self, session, fields, image), fields(uid = %session.uid(), name = %fields.name))]
    pub async fn create_product(&self, session: &Session, fields: NewProduct, image: Option<ImageUpload>) -> Result<Product> {
        session.require_admin()?;
        if fields.name.trim().is_empty() { return Err(ProductError::MissingName.into()); }
        if fields.price.is_sign_negative() && !fields.price.is_zero() { return Err(ProductError::NegativePrice.into()); }
        let image = image.ok_or(ProductError::MissingImage)?;

        let url = self.media.upload(&image).await?;
        let mut product = Product::create(fields.name, Money::new(fields.price, &self.currency), url)?
            .with_description(fields.description)
            .with_category(fields.category);
        self.products.insert_product(&product).await?;
        info!(product_id = %product.id(), image = product.image(), "Product created");
        publish_all(self.publisher.as_ref(), product.take_events()).await;
        Ok(product)
    }

    #[instrument(skip(self, session, patch), fields(uid = %session.uid()))]
    pub async fn update_product(&self, session: &Session, id: Uuid, patch: ProductPatch) -> Result<Product> {
        session.require_admin()?;
        let mut product = self.products.find_product(id).await?.ok_or(AppError::NotFound("Product"))?;
        product.apply(patch)?;
        if !self.products.update_product(&product).await? {
            return Err(AppError::NotFound("Product"));
        }
        info!(product_id = %id, "Product updated");
        publish_all(self.publisher.as_ref(), product.take_events()).await;
        Ok(product)
    }

    /// Existing cart lines and order snapshots keep their copy of the product.
    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn delete_product(&self, session: &Session, id: Uuid) -> Result<()> {
        session.require_admin()?;
        let mut product = self.products.find_product(id).await?.ok_or(AppError::NotFound("Product"))?;
        if !self.products.delete_product(id).await? {
            return Err(AppError::NotFound("Product"));
        }
        product.mark_deleted();
        info!(product_id = %id, "Product deleted");
        publish_all(self.publisher.as_ref(), product.take_events()).await;
        Ok(())
    }

    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn promote(&self, session: &Session, uid: &UserId) -> Result<()> {
        session.require_admin()?;
        if !self.users.set_role(uid, Role::Admin).await? {
            return Err(AppError::NotFound("User"));
        }
        info!(promoted = %uid, "User promoted to admin");
        Ok(())
    }

    /// Records cash received for a cash-on-delivery order.
    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn mark_collected(&self, session: &Session, user_id: &UserId, order_id: Uuid) -> Result<Order> {
        session.require_admin()?;
        let mut order = self.orders.find_order(user_id, order_id).await?.ok_or(OrderError::NotFound)?;
        order.mark_collected()?;
        self.orders.update_order(&order).await?;
        info!(%order_id, customer = %user_id, "Payment collected");
        publish_all(self.publisher.as_ref(), order.take_events()).await;
        Ok(order)
    }
}
