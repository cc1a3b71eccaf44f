//! Checkout: address → shipping → payment → confirmation.
//!
//! The order created at the address step is the handle for every later
//! step; each step checks the order's status before touching it.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{
    shipping_methods, CardDetails, CardSummary, CartError, Order, OrderError, PaymentMethod, ShippingInfo, ShippingMethod, ShippingMethodId,
};
use crate::error::Result;
use crate::publisher::{publish_all, EventPublisher};
use crate::session::Session;
use crate::store::{CartRepository, OrderRepository, ShippingRepository};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub card: Option<CardDetails>,
}

#[derive(Clone)]
pub struct CheckoutService {
    carts: Arc<dyn CartRepository>,
    shipping: Arc<dyn ShippingRepository>,
    orders: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<dyn CartRepository>, shipping: Arc<dyn ShippingRepository>, orders: Arc<dyn OrderRepository>,
        publisher: Arc<dyn EventPublisher>, currency: impl Into<String>,
    ) -> Self {
        Self { carts, shipping, orders, publisher, currency: currency.into() }
    }

    pub fn shipping_methods(&self) -> Vec<ShippingMethod> { shipping_methods(&self.currency) }

    /// Saves the shipping profile and snapshots the cart into a pending order.
    #[instrument(skip(self, session, info), fields(uid = %session.uid()))]
    pub async fn submit_address(&self, session: &Session, info: ShippingInfo) -> Result<Order> {
        info.validate()?;
        let lines = self.carts.cart_lines(session.uid()).await?;
        if lines.is_empty() {
            warn!("Checkout attempted with an empty cart");
            return Err(CartError::Empty.into());
        }
        self.shipping.save_shipping(session.uid(), &info).await?;
        let mut order = Order::place(session.uid().clone(), session.customer_name(), lines, info, &self.currency)?;
        self.orders.insert_order(&order).await?;
        info!(order_id = %order.id(), order_no = order.order_no(), subtotal = %order.subtotal(), "Order placed");
        publish_all(self.publisher.as_ref(), order.take_events()).await;
        Ok(order)
    }

    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn select_shipping(&self, session: &Session, order_id: Uuid, method: &str) -> Result<Order> {
        let method = ShippingMethodId::parse(method).ok_or_else(|| OrderError::UnknownShippingMethod(method.to_string()))?;
        let mut order = self.load(session, order_id).await?;
        order.select_shipping(method.method(&self.currency))?;
        self.orders.update_order(&order).await?;
        info!(%order_id, method = method.as_str(), "Shipping method selected");
        publish_all(self.publisher.as_ref(), order.take_events()).await;
        Ok(order)
    }

    /// Simulated payment. Once the order is paid or set to cash on delivery, the ordered
    /// lines leave the cart; anything added after the address step stays.
    #[instrument(skip(self, session, request), fields(uid = %session.uid(), method = ?request.method))]
    pub async fn pay(&self, session: &Session, order_id: Uuid, request: PaymentRequest) -> Result<Order> {
        let card = match request.method {
            PaymentMethod::Card => {
                let card = request.card.as_ref().ok_or(OrderError::MissingCard)?;
                card.validate()?;
                Some(CardSummary::from(card))
            }
            PaymentMethod::Paypal | PaymentMethod::Cod => None,
        };
        let mut order = self.load(session, order_id).await?;
        order.take_payment(request.method, card)?;
        self.orders.update_order(&order).await?;
        self.carts.remove_ordered(session.uid(), order.items()).await?;
        info!(%order_id, status = %order.status(), total = %order.total(), "Payment recorded");
        publish_all(self.publisher.as_ref(), order.take_events()).await;
        Ok(order)
    }

    pub async fn order(&self, session: &Session, order_id: Uuid) -> Result<Order> {
        self.load(session, order_id).await
    }

    /// Newest first.
    pub async fn orders(&self, session: &Session) -> Result<Vec<Order>> {
        Ok(self.orders.list_orders(session.uid()).await?)
    }

    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    pub async fn cancel(&self, session: &Session, order_id: Uuid) -> Result<Order> {
        let mut order = self.load(session, order_id).await?;
        order.cancel()?;
        self.orders.update_order(&order).await?;
        info!(%order_id, "Order cancelled");
        publish_all(self.publisher.as_ref(), order.take_events()).await;
        Ok(order)
    }

    async fn load(&self, session: &Session, order_id: Uuid) -> Result<Order> {
        let order = self.orders.find_order(session.uid(), order_id).await?.ok_or(OrderError::NotFound)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderStatus, PaymentStatus, Product, User};
    use crate::domain::value_objects::{Money, UserId};
    use crate::error::AppError;
    use crate::publisher::RecordingPublisher;
    use crate::services::cart::CartService;
    use crate::store::{MemoryStore, ProductRepository};
    use rust_decimal::Decimal;

    struct Fixture {
        cart: CartService,
        checkout: CheckoutService,
        events: Arc<RecordingPublisher>,
        session: Session,
        tee: Product,
        cap: Product,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let events = Arc::new(RecordingPublisher::new());
        let tee = Product::create("Tee", Money::php(Decimal::new(1000, 0)), "tee.png").unwrap();
        let cap = Product::create("Cap", Money::php(Decimal::new(250, 0)), "cap.png").unwrap();
        store.insert_product(&tee).await.unwrap();
        store.insert_product(&cap).await.unwrap();
        Fixture {
            cart: CartService::new(store.clone(), store.clone(), "PHP"),
            checkout: CheckoutService::new(store.clone(), store.clone(), store, events.clone(), "PHP"),
            events,
            session: Session::new(User::new(UserId::new("u1"), None), Some("Juan Dela Cruz".into())),
            tee,
            cap,
        }
    }

    fn address() -> ShippingInfo {
        ShippingInfo {
            full_name: "Juan Dela Cruz".into(), address: "12 Rizal St".into(), city: "Makati".into(),
            zip_code: "1200".into(), phone_number: "09171234567".into(),
        }
    }

    fn card() -> CardDetails {
        CardDetails {
            name: "Juan Dela Cruz".into(), card_number: "4111111111111111".into(), expiry_month: "09".into(),
            expiry_year: "2030".into(), cvc: "123".into(),
        }
    }

    #[tokio::test]
    async fn test_full_checkout_with_card() {
        let f = fixture().await;
        f.cart.add_to_cart(&f.session, f.tee.id(), "M", 2).await.unwrap();
        f.cart.add_to_cart(&f.session, f.cap.id(), "S", 1).await.unwrap();

        let order = f.checkout.submit_address(&f.session, address()).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.subtotal().amount(), Decimal::new(2250, 0));
        assert_eq!(order.customer_name(), "Juan Dela Cruz");

        let order = f.checkout.select_shipping(&f.session, order.id(), "jnt").await.unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);

        let paid = f.checkout.pay(&f.session, order.id(), PaymentRequest { method: PaymentMethod::Card, card: Some(card()) }).await.unwrap();
        assert_eq!(paid.status(), OrderStatus::Paid);
        assert_eq!(paid.total().amount(), Decimal::new(2300, 0));
        let payment = paid.payment().unwrap();
        assert_eq!(payment.card.as_ref().unwrap().last4, "1111");
        assert_eq!(payment.status, PaymentStatus::Paid);

        assert!(f.cart.lines(&f.session).await.unwrap().is_empty());
        let stored = f.checkout.order(&f.session, order.id()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Paid);
        assert_eq!(f.events.events().len(), 3);
    }

    #[tokio::test]
    async fn test_payment_keeps_lines_added_after_the_snapshot() {
        let f = fixture().await;
        f.cart.add_to_cart(&f.session, f.tee.id(), "M", 2).await.unwrap();
        let order = f.checkout.submit_address(&f.session, address()).await.unwrap();
        f.cart.add_to_cart(&f.session, f.tee.id(), "M", 1).await.unwrap();
        let cap = f.cart.add_to_cart(&f.session, f.cap.id(), "S", 1).await.unwrap();
        f.checkout.select_shipping(&f.session, order.id(), "jnt").await.unwrap();
        f.checkout.pay(&f.session, order.id(), PaymentRequest { method: PaymentMethod::Paypal, card: None }).await.unwrap();

        let mut left = f.cart.lines(&f.session).await.unwrap();
        left.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(left.len(), 2);
        assert_eq!((left[0].id.clone(), left[0].quantity.value()), (cap.id, 1));
        assert_eq!((left[1].name.as_str(), left[1].quantity.value()), ("Tee", 1));
    }

    #[tokio::test]
    async fn test_snapshot_is_independent_of_later_cart_changes() {
        let f = fixture().await;
        let line = f.cart.add_to_cart(&f.session, f.tee.id(), "M", 2).await.unwrap();
        let order = f.checkout.submit_address(&f.session, address()).await.unwrap();

        f.cart.update_quantity(&f.session, &line.id, 9).await.unwrap();
        f.cart.add_to_cart(&f.session, f.cap.id(), "S", 1).await.unwrap();

        let stored = f.checkout.order(&f.session, order.id()).await.unwrap();
        assert_eq!(stored.items().len(), 1);
        assert_eq!(stored.items()[0].quantity.value(), 2);
        assert_eq!(stored.subtotal().amount(), Decimal::new(2000, 0));
    }

    #[tokio::test]
    async fn test_cash_on_delivery_awaits_payment() {
        let f = fixture().await;
        f.cart.add_to_cart(&f.session, f.cap.id(), "S", 1).await.unwrap();
        let order = f.checkout.submit_address(&f.session, address()).await.unwrap();
        f.checkout.select_shipping(&f.session, order.id(), "ninja").await.unwrap();
        let order = f.checkout.pay(&f.session, order.id(), PaymentRequest { method: PaymentMethod::Cod, card: None }).await.unwrap();
        assert_eq!(order.status(), OrderStatus::AwaitingPayment);
        assert_eq!(order.total().amount(), Decimal::new(295, 0));
    }

    #[tokio::test]
    async fn test_steps_are_guarded() {
        let f = fixture().await;
        assert!(matches!(f.checkout.submit_address(&f.session, address()).await, Err(AppError::InvalidInput(_))));

        f.cart.add_to_cart(&f.session, f.tee.id(), "M", 1).await.unwrap();
        let blank = ShippingInfo { zip_code: String::new(), ..address() };
        assert!(matches!(f.checkout.submit_address(&f.session, blank).await, Err(AppError::Validation(_))));

        let order = f.checkout.submit_address(&f.session, address()).await.unwrap();
        let paypal = PaymentRequest { method: PaymentMethod::Paypal, card: None };
        assert!(matches!(f.checkout.pay(&f.session, order.id(), paypal.clone()).await, Err(AppError::Conflict(_))));
        assert!(matches!(f.checkout.select_shipping(&f.session, order.id(), "dhl").await, Err(AppError::InvalidInput(_))));

        f.checkout.select_shipping(&f.session, order.id(), "lbc").await.unwrap();
        let no_card = PaymentRequest { method: PaymentMethod::Card, card: None };
        assert!(matches!(f.checkout.pay(&f.session, order.id(), no_card).await, Err(AppError::InvalidInput(_))));
        let bad_card = PaymentRequest { method: PaymentMethod::Card, card: Some(CardDetails { cvc: "1".into(), ..card() }) };
        assert!(matches!(f.checkout.pay(&f.session, order.id(), bad_card).await, Err(AppError::Validation(_))));

        f.checkout.pay(&f.session, order.id(), paypal.clone()).await.unwrap();
        assert!(matches!(f.checkout.pay(&f.session, order.id(), paypal).await, Err(AppError::Conflict(_))));
        assert!(matches!(f.checkout.cancel(&f.session, order.id()).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_orders_are_scoped_to_their_owner() {
        let f = fixture().await;
        f.cart.add_to_cart(&f.session, f.tee.id(), "M", 1).await.unwrap();
        let first = f.checkout.submit_address(&f.session, address()).await.unwrap();
        let second = f.checkout.submit_address(&f.session, address()).await.unwrap();

        let history = f.checkout.orders(&f.session).await.unwrap();
        assert_eq!(history.iter().map(|o| o.id()).collect::<Vec<_>>(), vec![second.id(), first.id()]);

        let stranger = Session::new(User::new(UserId::new("u2"), None), None);
        assert!(matches!(f.checkout.order(&stranger, first.id()).await, Err(AppError::NotFound("Order"))));
        assert!(f.checkout.orders(&stranger).await.unwrap().is_empty());

        let cancelled = f.checkout.cancel(&f.session, first.id()).await.unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    }
}
