//! Who is making a request.
//!
//! Sign-in itself happens at the identity provider; the gateway in front of
//! this service forwards the verified account as an [`Identity`]. Every
//! workflow operation takes the resolved [`Session`] explicitly.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::aggregates::{Role, User};
use crate::domain::value_objects::UserId;
use crate::error::{AppError, Result};
use crate::store::UserRepository;

/// Account details vouched for by the identity provider.
#[derive(Clone, Debug)]
pub struct Identity {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Session {
    user: User,
    display_name: Option<String>,
}

impl Session {
    pub fn new(user: User, display_name: Option<String>) -> Self { Self { user, display_name } }

    pub fn uid(&self) -> &UserId { &self.user.uid }
    pub fn email(&self) -> Option<&str> { self.user.email.as_deref() }
    pub fn display_name(&self) -> Option<&str> { self.display_name.as_deref() }
    pub fn role(&self) -> Role { self.user.role }
    pub fn is_admin(&self) -> bool { self.user.is_admin() }

    /// Name printed on orders.
    pub fn customer_name(&self) -> &str {
        self.display_name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or("Unknown Customer")
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() { Ok(()) } else { Err(AppError::Forbidden) }
    }
}

#[derive(Clone)]
pub struct SessionResolver {
    users: Arc<dyn UserRepository>,
    bootstrap_admins: Vec<UserId>,
}

impl SessionResolver {
    pub fn new(users: Arc<dyn UserRepository>) -> Self { Self { users, bootstrap_admins: vec![] } }

    /// Accounts promoted to admin the first time they are seen as plain users.
    pub fn with_bootstrap_admins(mut self, uids: Vec<UserId>) -> Self { self.bootstrap_admins = uids; self }

    /// Records the account on first sight with the `user` role and returns
    /// its session. An existing role is kept.
    pub async fn resolve(&self, identity: Identity) -> Result<Session> {
        let mut user = self.users.ensure_user(&User::new(identity.uid.clone(), identity.email.clone())).await?;
        if !user.is_admin() && self.bootstrap_admins.contains(&user.uid) {
            self.users.set_role(&user.uid, Role::Admin).await?;
            user.role = Role::Admin;
            info!(uid = %user.uid, "Bootstrap admin promoted");
        }
        debug!(uid = %user.uid, role = %user.role, "Session resolved");
        Ok(Session::new(user, identity.display_name))
    }
}
