//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod shipping;
pub mod user;

pub use product::{Category, Product, ProductError, ProductPatch};
pub use order::{CardDetails, CardSummary, Order, OrderError, OrderStatus, Payment, PaymentMethod, PaymentStatus};
pub use cart::{compute_subtotal, Cart, CartError, CartLine};
pub use shipping::{shipping_methods, ShippingInfo, ShippingMethod, ShippingMethodId};
pub use user::{Role, User};
