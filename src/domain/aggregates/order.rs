//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError};
use crate::domain::aggregates::cart::{compute_subtotal, CartLine};
use crate::domain::aggregates::shipping::{not_blank, ShippingInfo, ShippingMethod};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, MoneyError, UserId};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    order_no: String,
    user_id: UserId,
    customer_name: String,
    items: Vec<CartLine>,
    shipping_info: ShippingInfo,
    subtotal: Money,
    shipping_method: Option<ShippingMethod>,
    payment: Option<Payment>,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Where an order is in checkout.
///
/// `Pending` → `Shipped` → `Paid` | `AwaitingPayment` → `Paid`. Any state
/// that is not `Paid` or `Cancelled` can be cancelled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    /// Shipping method chosen.
    Shipped,
    AwaitingPayment,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Shipped)
                | (Shipped, Shipped)
                | (Shipped, Paid)
                | (Shipped, AwaitingPayment)
                | (AwaitingPayment, Paid)
                | (Pending | Shipped | AwaitingPayment, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool { matches!(self, Self::Paid | Self::Cancelled) }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { Paypal, Card, Cod }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { Pending, Paid }

/// Card form as submitted. Only [`CardSummary`] is ever stored.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "sixteen_digits")]
    pub card_number: String,
    #[validate(custom = "not_blank")]
    pub expiry_month: String,
    #[validate(custom = "not_blank")]
    pub expiry_year: String,
    #[validate(custom = "three_digits")]
    pub cvc: String,
}

fn digits(value: &str, count: usize, code: &'static str) -> Result<(), ValidationError> {
    if value.len() == count && value.bytes().all(|b| b.is_ascii_digit()) { Ok(()) } else { Err(ValidationError::new(code)) }
}

fn sixteen_digits(value: &str) -> Result<(), ValidationError> { digits(value, 16, "card_number_16_digits") }
fn three_digits(value: &str) -> Result<(), ValidationError> { digits(value, 3, "cvc_3_digits") }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSummary {
    pub cardholder_name: String,
    pub last4: String,
    pub expiry_month: String,
    pub expiry_year: String,
}

impl From<&CardDetails> for CardSummary {
    fn from(card: &CardDetails) -> Self {
        let start = card.card_number.len().saturating_sub(4);
        Self {
            cardholder_name: card.name.trim().to_string(),
            last4: card.card_number.get(start..).unwrap_or_default().to_string(),
            expiry_month: card.expiry_month.clone(),
            expiry_year: card.expiry_year.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Money,
    pub card: Option<CardSummary>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Snapshots `items` into a new pending order.
    pub fn place(
        user_id: UserId, customer_name: impl Into<String>, items: Vec<CartLine>, shipping_info: ShippingInfo, currency: &str,
    ) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let subtotal = compute_subtotal(&items, currency)?;
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut order = Self {
            id, order_no: format!("ORD-{}", now.timestamp_millis()), user_id: user_id.clone(),
            customer_name: customer_name.into(), items, shipping_info, total: subtotal.clone(), subtotal: subtotal.clone(),
            shipping_method: None, payment: None, status: OrderStatus::Pending, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: id, user_id: user_id.to_string(), subtotal: subtotal.amount() }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_no(&self) -> &str { &self.order_no }
    pub fn user_id(&self) -> &UserId { &self.user_id }
    pub fn customer_name(&self) -> &str { &self.customer_name }
    pub fn items(&self) -> &[CartLine] { &self.items }
    pub fn shipping_info(&self) -> &ShippingInfo { &self.shipping_info }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn shipping_method(&self) -> Option<&ShippingMethod> { self.shipping_method.as_ref() }
    pub fn payment(&self) -> Option<&Payment> { self.payment.as_ref() }
    pub fn total(&self) -> &Money { &self.total }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn belongs_to(&self, user_id: &UserId) -> bool { &self.user_id == user_id }

    pub fn select_shipping(&mut self, method: ShippingMethod) -> Result<(), OrderError> {
        self.transition(OrderStatus::Shipped)?;
        self.raise_event(DomainEvent::Order(OrderEvent::ShippingSelected { order_id: self.id, method: method.id.as_str().to_string() }));
        self.shipping_method = Some(method);
        Ok(())
    }

    /// Simulated payment. Cash on delivery leaves the payment pending.
    pub fn take_payment(&mut self, method: PaymentMethod, card: Option<CardSummary>) -> Result<(), OrderError> {
        let fee = self.shipping_method.as_ref().ok_or(OrderError::MissingShipping)?.fee.clone();
        let (next, status) = match method {
            PaymentMethod::Cod => (OrderStatus::AwaitingPayment, PaymentStatus::Pending),
            PaymentMethod::Paypal | PaymentMethod::Card => (OrderStatus::Paid, PaymentStatus::Paid),
        };
        let total = self.subtotal.add(&fee)?;
        self.transition(next)?;
        let now = Utc::now();
        self.payment = Some(Payment {
            method, status, amount: total.clone(), card, created_at: now,
            paid_at: (status == PaymentStatus::Paid).then_some(now),
        });
        self.total = total;
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentTaken { order_id: self.id, method, status: next, total: self.total.amount() }));
        Ok(())
    }

    /// Cash on delivery received.
    pub fn mark_collected(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::AwaitingPayment {
            return Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Paid });
        }
        self.transition(OrderStatus::Paid)?;
        if let Some(payment) = self.payment.as_mut() {
            payment.status = PaymentStatus::Paid;
            payment.paid_at = Some(self.updated_at);
        }
        self.raise_event(DomainEvent::Order(OrderEvent::Collected { order_id: self.id }));
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled)?;
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id }));
        Ok(())
    }

    fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("an order needs at least one item")]
    NoItems,
    #[error("order not found")]
    NotFound,
    #[error("choose a shipping method first")]
    MissingShipping,
    #[error("unknown shipping method: {0}")]
    UnknownShippingMethod(String),
    #[error("card details are required for card payments")]
    MissingCard,
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error(transparent)]
    Money(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::shipping::ShippingMethodId;
    use crate::domain::value_objects::{Quantity, Size};
    use rust_decimal::Decimal;

    fn order() -> Order {
        let items = vec![
            CartLine::new(Uuid::now_v7(), "Tee", Money::php(Decimal::new(1000, 0)), Size::new("M").unwrap(), Quantity::new(2).unwrap(), ""),
            CartLine::new(Uuid::now_v7(), "Cap", Money::php(Decimal::new(250, 0)), Size::new("S").unwrap(), Quantity::ONE, ""),
        ];
        Order::place(UserId::new("u1"), "Juan", items, ShippingInfo::default(), "PHP").unwrap()
    }

    #[test]
    fn test_order_workflow() {
        let mut order = order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.subtotal().amount(), Decimal::new(2250, 0));
        assert!(order.order_no().starts_with("ORD-"));
        order.select_shipping(ShippingMethodId::Jnt.method("PHP")).unwrap();
        order.select_shipping(ShippingMethodId::Lbc.method("PHP")).unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);
        order.take_payment(PaymentMethod::Paypal, None).unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);
        assert_eq!(order.total().amount(), Decimal::new(2310, 0));
        assert_eq!(order.payment().unwrap().status, PaymentStatus::Paid);
        assert_eq!(order.take_events().len(), 4);
        assert!(order.cancel().is_err());
    }

    #[test]
    fn test_payment_requires_shipping() {
        let mut order = order();
        assert_eq!(order.take_payment(PaymentMethod::Card, None).unwrap_err(), OrderError::MissingShipping);
    }

    #[test]
    fn test_cash_on_delivery() {
        let mut order = order();
        order.select_shipping(ShippingMethodId::Ninja.method("PHP")).unwrap();
        order.take_payment(PaymentMethod::Cod, None).unwrap();
        assert_eq!(order.status(), OrderStatus::AwaitingPayment);
        assert_eq!(order.payment().unwrap().status, PaymentStatus::Pending);
        order.mark_collected().unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);
        assert!(order.payment().unwrap().paid_at.is_some());
    }

    #[test]
    fn test_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(Paid.is_terminal());
    }

    #[test]
    fn test_card_validation() {
        let mut card = CardDetails {
            name: "Juan".into(), card_number: "4111111111111111".into(), expiry_month: "09".into(),
            expiry_year: "2030".into(), cvc: "123".into(),
        };
        assert!(card.validate().is_ok());
        assert_eq!(CardSummary::from(&card).last4, "1111");
        card.card_number = "4111-1111".into();
        card.cvc = "12a".into();
        let errors = card.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("card_number"));
        assert!(errors.field_errors().contains_key("cvc"));
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = Order::place(UserId::new("u"), "x", vec![], ShippingInfo::default(), "PHP").unwrap_err();
        assert_eq!(err, OrderError::NoItems);
    }
}
