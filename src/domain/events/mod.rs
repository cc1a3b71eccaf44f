//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{OrderStatus, PaymentMethod};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid, name: String },
    Updated { product_id: Uuid },
    Deleted { product_id: Uuid },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, user_id: String, subtotal: Decimal },
    ShippingSelected { order_id: Uuid, method: String },
    PaymentTaken { order_id: Uuid, method: PaymentMethod, status: OrderStatus, total: Decimal },
    Collected { order_id: Uuid },
    Cancelled { order_id: Uuid },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> String {
        match self {
            Self::Product(e) => format!("unicart.product.{}", match e {
                ProductEvent::Created { .. } => "created",
                ProductEvent::Updated { .. } => "updated",
                ProductEvent::Deleted { .. } => "deleted",
            }),
            Self::Order(e) => format!("unicart.order.{}", match e {
                OrderEvent::Placed { .. } => "placed",
                OrderEvent::ShippingSelected { .. } => "shipping_selected",
                OrderEvent::PaymentTaken { .. } => "payment_taken",
                OrderEvent::Collected { .. } => "collected",
                OrderEvent::Cancelled { .. } => "cancelled",
            }),
        }
    }
}
