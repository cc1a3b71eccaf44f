//! Postgres adapter. Orders and shipping profiles are stored as JSONB documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CartRepository, OrderRepository, ProductRepository, ShippingRepository, StoreError, UserRepository};
use crate::domain::aggregates::{CartError, CartLine, Category, Order, Product, Role, ShippingInfo, User};
use crate::domain::value_objects::{CartLineId, Money, Quantity, QuantityError, Size, UserId};

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, name: String, price: Decimal, currency: String, description: String, category: Option<String>,
    image: String, images: Vec<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let category = r.category.as_deref().map(str::parse::<Category>).transpose().map_err(|e| StoreError::Corrupt(format!("product {}: {e}", r.id)))?;
        Ok(Product::restore(r.id, r.name, Money::new(r.price, &r.currency), r.description, category, r.image, r.images, r.created_at, r.updated_at))
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    line_id: String, product_id: Uuid, name: String, price: Decimal, currency: String, quantity: i64,
    size: String, image: String, added_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = StoreError;

    fn try_from(r: CartLineRow) -> Result<Self, Self::Error> {
        let corrupt = |e: String| StoreError::Corrupt(format!("cart line {}: {e}", r.line_id));
        let quantity = Quantity::try_from(r.quantity).map_err(|e| corrupt(e.to_string()))?;
        let size = Size::new(r.size.as_str()).map_err(|e| corrupt(e.to_string()))?;
        Ok(CartLine {
            id: CartLineId::from_raw(r.line_id.as_str()), product_id: r.product_id, name: r.name,
            price: Money::new(r.price, &r.currency), quantity, size, image: r.image, added_at: r.added_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow { uid: String, email: Option<String>, role: String }

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = r.role.parse::<Role>().map_err(StoreError::Corrupt)?;
        Ok(User { uid: UserId::new(r.uid), email: r.email, role })
    }
}

const CART_COLUMNS: &str = "line_id, product_id, name, price, currency, quantity, size, image, added_at";

/// Largest quantity a cart line can hold.
const MAX_QUANTITY: u32 = u32::MAX;

#[async_trait]
impl ProductRepository for PgStore {
    async fn insert_product(&self, p: &Product) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO products (id, name, price, currency, description, category, image, images, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(p.id()).bind(p.name()).bind(p.price().amount()).bind(p.price().currency()).bind(p.description())
            .bind(p.category().map(|c| c.as_str())).bind(p.image()).bind(p.images()).bind(p.created_at()).bind(p.updated_at())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<bool, StoreError> {
        let done = sqlx::query("UPDATE products SET name = $2, price = $3, currency = $4, description = $5, category = $6, image = $7, images = $8, updated_at = $9 WHERE id = $1")
            .bind(p.id()).bind(p.name()).bind(p.price().amount()).bind(p.price().currency()).bind(p.description())
            .bind(p.category().map(|c| c.as_str())).bind(p.image()).bind(p.images()).bind(p.updated_at())
            .execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?
            .map(Product::try_from).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY created_at, id")
            .fetch_all(&self.pool).await?
            .into_iter().map(Product::try_from).collect()
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn ensure_user(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query_as::<_, UserRow>("INSERT INTO users (uid, email, role) VALUES ($1, $2, $3) ON CONFLICT (uid) DO UPDATE SET email = COALESCE(users.email, EXCLUDED.email) RETURNING uid, email, role")
            .bind(user.uid.as_str()).bind(&user.email).bind(user.role.as_str())
            .fetch_one(&self.pool).await?
            .try_into()
    }

    async fn find_user(&self, uid: &UserId) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT uid, email, role FROM users WHERE uid = $1")
            .bind(uid.as_str()).fetch_optional(&self.pool).await?
            .map(User::try_from).transpose()
    }

    async fn set_role(&self, uid: &UserId, role: Role) -> Result<bool, StoreError> {
        let done = sqlx::query("UPDATE users SET role = $2 WHERE uid = $1").bind(uid.as_str()).bind(role.as_str()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn cart_lines(&self, user: &UserId) -> Result<Vec<CartLine>, StoreError> {
        sqlx::query_as::<_, CartLineRow>(&format!("SELECT {CART_COLUMNS} FROM cart_lines WHERE user_id = $1 ORDER BY added_at, line_id"))
            .bind(user.as_str()).fetch_all(&self.pool).await?
            .into_iter().map(CartLine::try_from).collect()
    }

    async fn merge_line(&self, user: &UserId, l: &CartLine) -> Result<CartLine, StoreError> {
        let merged = sqlx::query_as::<_, CartLineRow>(&format!(
            "INSERT INTO cart_lines (user_id, {CART_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (user_id, line_id) DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity \
             WHERE cart_lines.quantity + EXCLUDED.quantity <= {MAX_QUANTITY} RETURNING {CART_COLUMNS}"
        ))
            .bind(user.as_str()).bind(l.id.as_str()).bind(l.product_id).bind(&l.name).bind(l.price.amount()).bind(l.price.currency())
            .bind(i64::from(l.quantity.value())).bind(l.size.as_str()).bind(&l.image).bind(l.added_at)
            .fetch_optional(&self.pool).await?;
        match merged {
            Some(row) => row.try_into(),
            None => {
                let current: i64 = sqlx::query_scalar("SELECT quantity FROM cart_lines WHERE user_id = $1 AND line_id = $2")
                    .bind(user.as_str()).bind(l.id.as_str()).fetch_one(&self.pool).await?;
                let sum = current + i64::from(l.quantity.value());
                Err(CartError::Quantity(QuantityError::TooLarge(sum)).into())
            }
        }
    }

    async fn set_line_quantity(&self, user: &UserId, id: &CartLineId, quantity: Quantity) -> Result<Option<CartLine>, StoreError> {
        sqlx::query_as::<_, CartLineRow>(&format!("UPDATE cart_lines SET quantity = $3 WHERE user_id = $1 AND line_id = $2 RETURNING {CART_COLUMNS}"))
            .bind(user.as_str()).bind(id.as_str()).bind(i64::from(quantity.value()))
            .fetch_optional(&self.pool).await?
            .map(CartLine::try_from).transpose()
    }

    async fn remove_line(&self, user: &UserId, id: &CartLineId) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND line_id = $2").bind(user.as_str()).bind(id.as_str()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn remove_ordered(&self, user: &UserId, items: &[CartLine]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for item in items {
            let ordered = i64::from(item.quantity.value());
            sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND line_id = $2 AND quantity <= $3")
                .bind(user.as_str()).bind(item.id.as_str()).bind(ordered).execute(&mut *tx).await?;
            sqlx::query("UPDATE cart_lines SET quantity = quantity - $3 WHERE user_id = $1 AND line_id = $2")
                .bind(user.as_str()).bind(item.id.as_str()).bind(ordered).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ShippingRepository for PgStore {
    async fn save_shipping(&self, user: &UserId, info: &ShippingInfo) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO shipping_profiles (user_id, info, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (user_id) DO UPDATE SET info = EXCLUDED.info, updated_at = NOW()")
            .bind(user.as_str()).bind(Json(info)).execute(&self.pool).await?;
        Ok(())
    }

    async fn find_shipping(&self, user: &UserId) -> Result<Option<ShippingInfo>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<ShippingInfo>>("SELECT info FROM shipping_profiles WHERE user_id = $1")
            .bind(user.as_str()).fetch_optional(&self.pool).await?;
        Ok(row.map(|Json(info)| info))
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert_order(&self, o: &Order) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO orders (id, user_id, status, document, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(o.id()).bind(o.user_id().as_str()).bind(o.status().as_str()).bind(Json(o)).bind(o.created_at()).bind(o.updated_at())
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_order(&self, o: &Order) -> Result<(), StoreError> {
        let done = sqlx::query("UPDATE orders SET status = $3, document = $4, updated_at = $5 WHERE id = $1 AND user_id = $2")
            .bind(o.id()).bind(o.user_id().as_str()).bind(o.status().as_str()).bind(Json(o)).bind(o.updated_at())
            .execute(&self.pool).await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::Corrupt(format!("order {} vanished", o.id())));
        }
        Ok(())
    }

    async fn find_order(&self, user: &UserId, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Order>>("SELECT document FROM orders WHERE user_id = $1 AND id = $2")
            .bind(user.as_str()).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|Json(order)| order))
    }

    async fn list_orders(&self, user: &UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<Order>>("SELECT document FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user.as_str()).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(order)| order).collect())
    }
}
