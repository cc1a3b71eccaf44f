//! Storefront workflows. Every operation that acts for a user takes its [`Session`](crate::session::Session).

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;

use std::sync::Arc;

pub use admin::{AdminService, NewProduct};
pub use cart::{CartService, CartSummary};
pub use catalog::{CatalogService, ProductFilter, SortOrder};
pub use checkout::{CheckoutService, PaymentRequest};

use crate::domain::value_objects::UserId;
use crate::media::MediaStore;
use crate::publisher::EventPublisher;
use crate::session::SessionResolver;
use crate::store::Repositories;

#[derive(Clone)]
pub struct Services {
    pub sessions: SessionResolver,
    pub cart: CartService,
    pub checkout: CheckoutService,
    pub catalog: CatalogService,
    pub admin: AdminService,
}

impl Services {
    pub fn new(
        repos: Repositories, media: Arc<dyn MediaStore>, publisher: Arc<dyn EventPublisher>, currency: &str, admin_uids: Vec<UserId>,
    ) -> Self {
        Self {
            sessions: SessionResolver::new(repos.users.clone()).with_bootstrap_admins(admin_uids),
            cart: CartService::new(repos.carts.clone(), repos.products.clone(), currency),
            checkout: CheckoutService::new(repos.carts, repos.shipping, repos.orders.clone(), publisher.clone(), currency),
            catalog: CatalogService::new(repos.products.clone()),
            admin: AdminService::new(repos.products, repos.users, repos.orders, media, publisher, currency),
        }
    }
}
