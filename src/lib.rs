//! UniCart Storefront
//!
//! Apparel storefront backend: catalog, cart, checkout and admin product management.
//!
//! ## Features
//! - Product catalog with category filters and sorting
//! - Per-user carts keyed by product and size
//! - Step-by-step checkout (address, shipping, payment) over order snapshots
//! - Order history and cash-on-delivery collection
//! - Admin product management with image uploads
//! - Postgres or in-memory persistence, NATS domain events

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod media;
pub mod publisher;
pub mod services;
pub mod session;
pub mod store;

pub use config::Config;
pub use domain::aggregates::*;
pub use domain::value_objects::*;
pub use error::{AppError, Result};
pub use session::{Identity, Session};
