use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use ulid::Ulid;

type Result<T> = std::result::Result<T, Error>;

/// A customer's cart. `restaurant_id` is the restaurant of the items
/// currently in the cart; `None` when the cart is empty.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Cart {
    pub id: String,
    pub customer_id: String,
    pub restaurant_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub menu_item_id: String,
    pub quantity: i32,
    pub added_at: NaiveDateTime,
}

/// Result of an atomic add: whether items from another restaurant were
/// discarded first, and the line's quantity after the add.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub cleared: bool,
    pub quantity: i32,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub type DynCartStore = Arc<dyn CartStore + Send + Sync>;

#[async_trait]
pub trait CartStore {
    async fn find_cart(&self, customer_id: &str) -> Result<Option<Cart>>;
    async fn list_items(&self, cart_id: &str) -> Result<Vec<CartItem>>;
    /// Get-or-create the customer's cart and add one unit of the menu item.
    /// Items from a different restaurant are deleted first
    /// (last-restaurant-wins). The whole operation is atomic.
    async fn add_item(
        &self,
        customer_id: &str,
        menu_item_id: &str,
        restaurant_id: &str,
    ) -> Result<AddOutcome>;
    /// Returns true if a matching line existed and was removed.
    async fn remove_item(&self, cart_id: &str, menu_item_id: &str) -> Result<bool>;
    /// Overwrites the line's quantity. Returns true if the line existed.
    async fn set_quantity(&self, cart_id: &str, menu_item_id: &str, quantity: i32) -> Result<bool>;
    async fn clear(&self, cart_id: &str) -> Result<()>;
}

pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_cart(&self, customer_id: &str) -> Result<Option<Cart>> {
        sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while fetching cart for customer {}: {}",
                    customer_id,
                    err
                );
                Error::UnexpectedError
            })
    }

    async fn list_items(&self, cart_id: &str) -> Result<Vec<CartItem>> {
        sqlx::query_as::<_, CartItem>(
            "SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY added_at",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while listing items of cart {}: {}",
                cart_id,
                err
            );
            Error::UnexpectedError
        })
    }

    async fn add_item(
        &self,
        customer_id: &str,
        menu_item_id: &str,
        restaurant_id: &str,
    ) -> Result<AddOutcome> {
        let err = |err: sqlx::Error| {
            tracing::error!(
                "Error occurred while adding menu item {} to the cart of customer {}: {}",
                menu_item_id,
                customer_id,
                err
            );
            Error::UnexpectedError
        };

        let mut tx = self.pool.begin().await.map_err(err)?;

        // Idempotent get-or-create; the unique index on customer_id makes
        // concurrent first-adds converge on a single cart.
        sqlx::query(
            "INSERT INTO carts (id, customer_id) VALUES ($1, $2) ON CONFLICT (customer_id) DO NOTHING",
        )
        .bind(Ulid::new().to_string())
        .bind(customer_id)
        .execute(&mut *tx)
        .await
        .map_err(err)?;

        let cart = sqlx::query_as::<_, Cart>(
            "SELECT * FROM carts WHERE customer_id = $1 FOR UPDATE",
        )
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(err)?;

        let mut cleared = false;
        if cart.restaurant_id.as_deref() != Some(restaurant_id) {
            if cart.restaurant_id.is_some() {
                let deleted = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
                    .bind(&cart.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(err)?;
                cleared = deleted.rows_affected() > 0;
            }
            sqlx::query("UPDATE carts SET restaurant_id = $1 WHERE id = $2")
                .bind(restaurant_id)
                .bind(&cart.id)
                .execute(&mut *tx)
                .await
                .map_err(err)?;
        }

        let quantity = sqlx::query_scalar::<_, i32>(
            "
            INSERT INTO cart_items (id, cart_id, menu_item_id, quantity)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (cart_id, menu_item_id)
            DO UPDATE SET quantity = cart_items.quantity + 1
            RETURNING quantity
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(&cart.id)
        .bind(menu_item_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(err)?;

        tx.commit().await.map_err(err)?;

        Ok(AddOutcome { cleared, quantity })
    }

    async fn remove_item(&self, cart_id: &str, menu_item_id: &str) -> Result<bool> {
        let err = |err: sqlx::Error| {
            tracing::error!(
                "Error occurred while removing an item from cart {}: {}",
                cart_id,
                err
            );
            Error::UnexpectedError
        };

        let mut tx = self.pool.begin().await.map_err(err)?;

        let deleted = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND menu_item_id = $2")
            .bind(cart_id)
            .bind(menu_item_id)
            .execute(&mut *tx)
            .await
            .map_err(err)?;

        sqlx::query(
            "
            UPDATE carts SET restaurant_id = NULL
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM cart_items WHERE cart_id = $1)
            ",
        )
        .bind(cart_id)
        .execute(&mut *tx)
        .await
        .map_err(err)?;

        tx.commit().await.map_err(err)?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn set_quantity(&self, cart_id: &str, menu_item_id: &str, quantity: i32) -> Result<bool> {
        sqlx::query("UPDATE cart_items SET quantity = $1 WHERE cart_id = $2 AND menu_item_id = $3")
            .bind(quantity)
            .bind(cart_id)
            .bind(menu_item_id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while updating quantity in cart {}: {}",
                    cart_id,
                    err
                );
                Error::UnexpectedError
            })
    }

    async fn clear(&self, cart_id: &str) -> Result<()> {
        let err = |err: sqlx::Error| {
            tracing::error!("Error occurred while clearing cart {}: {}", cart_id, err);
            Error::UnexpectedError
        };

        let mut tx = self.pool.begin().await.map_err(err)?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await
            .map_err(err)?;
        sqlx::query("UPDATE carts SET restaurant_id = NULL WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await
            .map_err(err)?;

        tx.commit().await.map_err(err)?;

        Ok(())
    }
}
