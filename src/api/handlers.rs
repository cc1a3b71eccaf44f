//! HTTP handlers over the services.

use std::str::FromStr;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::domain::aggregates::{CartLine, Category, Order, Product, ProductPatch, Role, ShippingInfo, ShippingMethod};
use crate::domain::value_objects::{CartLineId, UserId};
use crate::error::{AppError, Result};
use crate::media::ImageUpload;
use crate::services::{CartSummary, NewProduct, PaymentRequest, ProductFilter, SortOrder};
use crate::session::Session;

#[derive(Debug, Deserialize)]
pub struct ListParams { pub category: Option<String>, pub sort: Option<SortOrder> }

pub async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<Vec<Product>>> {
    let categories = p.category.as_deref().map(ProductFilter::parse_categories).transpose()?.unwrap_or_default();
    let filter = ProductFilter { categories, sort: p.sort.unwrap_or_default() };
    Ok(Json(s.services.catalog.list(&filter).await?))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    Ok(Json(s.services.catalog.get(id).await?))
}

pub async fn get_cart(State(s): State<AppState>, session: Session) -> Result<Json<CartSummary>> {
    Ok(Json(s.services.cart.summary(&session).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest { pub product_id: Uuid, pub size: String, #[serde(default = "one")] pub quantity: i64 }

fn one() -> i64 { 1 }

pub async fn add_to_cart(State(s): State<AppState>, session: Session, Json(r): Json<AddToCartRequest>) -> Result<(StatusCode, Json<CartLine>)> {
    let line = s.services.cart.add_to_cart(&session, r.product_id, &r.size, r.quantity).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest { pub quantity: i64 }

pub async fn update_cart_line(
    State(s): State<AppState>, session: Session, Path(line_id): Path<String>, Json(r): Json<UpdateQuantityRequest>,
) -> Result<Json<CartLine>> {
    Ok(Json(s.services.cart.update_quantity(&session, &CartLineId::from_raw(line_id), r.quantity).await?))
}

pub async fn remove_cart_line(State(s): State<AppState>, session: Session, Path(line_id): Path<String>) -> Result<StatusCode> {
    s.services.cart.remove_line(&session, &CartLineId::from_raw(line_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn shipping_methods(State(s): State<AppState>) -> Json<Vec<ShippingMethod>> {
    Json(s.services.checkout.shipping_methods())
}

pub async fn submit_address(State(s): State<AppState>, session: Session, Json(info): Json<ShippingInfo>) -> Result<(StatusCode, Json<Order>)> {
    let order = s.services.checkout.submit_address(&session, info).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct ShippingRequest { pub method: String }

pub async fn select_shipping(
    State(s): State<AppState>, session: Session, Path(order_id): Path<Uuid>, Json(r): Json<ShippingRequest>,
) -> Result<Json<Order>> {
    Ok(Json(s.services.checkout.select_shipping(&session, order_id, &r.method).await?))
}

pub async fn pay(State(s): State<AppState>, session: Session, Path(order_id): Path<Uuid>, Json(r): Json<PaymentRequest>) -> Result<Json<Order>> {
    Ok(Json(s.services.checkout.pay(&session, order_id, r).await?))
}

pub async fn list_orders(State(s): State<AppState>, session: Session) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.services.checkout.orders(&session).await?))
}

pub async fn get_order(State(s): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Order>> {
    Ok(Json(s.services.checkout.order(&session, id).await?))
}

pub async fn cancel_order(State(s): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<Json<Order>> {
    Ok(Json(s.services.checkout.cancel(&session, id).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse { pub uid: UserId, pub email: Option<String>, pub display_name: Option<String>, pub role: Role, pub is_admin: bool }

pub async fn me(session: Session) -> Json<MeResponse> {
    Json(MeResponse {
        uid: session.uid().clone(), email: session.email().map(str::to_string), display_name: session.display_name().map(str::to_string),
        role: session.role(), is_admin: session.is_admin(),
    })
}

/// Multipart form with `name`, `price`, `description`, `category` and an `image` file.
pub async fn create_product(State(s): State<AppState>, session: Session, mut form: Multipart) -> Result<(StatusCode, Json<Product>)> {
    session.require_admin()?;
    let invalid = |e: axum::extract::multipart::MultipartError| AppError::InvalidInput(e.to_string());
    let (mut name, mut price, mut description, mut category, mut image) = (String::new(), None, String::new(), None, None);
    while let Some(field) = form.next_field().await.map_err(invalid)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field.bytes().await.map_err(invalid)?.to_vec();
                image = Some(ImageUpload { file_name, content_type, bytes });
            }
            "name" => name = field.text().await.map_err(invalid)?,
            "description" => description = field.text().await.map_err(invalid)?,
            "price" => {
                let raw = field.text().await.map_err(invalid)?;
                price = Some(Decimal::from_str(raw.trim()).map_err(|_| AppError::InvalidInput(format!("invalid price: {raw}")))?);
            }
            "category" => {
                let raw = field.text().await.map_err(invalid)?;
                category = if raw.trim().is_empty() { None } else { Some(raw.trim().parse::<Category>()?) };
            }
            _ => {}
        }
    }
    let price = price.ok_or_else(|| AppError::InvalidInput("price is required".into()))?;
    let product = s.services.admin.create_product(&session, NewProduct { name, price, description, category }, image).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(State(s): State<AppState>, session: Session, Path(id): Path<Uuid>, Json(patch): Json<ProductPatch>) -> Result<Json<Product>> {
    Ok(Json(s.services.admin.update_product(&session, id, patch).await?))
}

pub async fn delete_product(State(s): State<AppState>, session: Session, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.services.admin.delete_product(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn promote_user(State(s): State<AppState>, session: Session, Path(uid): Path<String>) -> Result<StatusCode> {
    s.services.admin.promote(&session, &UserId::new(uid)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn collect_order(State(s): State<AppState>, session: Session, Path((user_id, order_id)): Path<(String, Uuid)>) -> Result<Json<Order>> {
    Ok(Json(s.services.admin.mark_collected(&session, &UserId::new(user_id), order_id).await?))
}
