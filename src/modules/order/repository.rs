use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use std::sync::Arc;
use ulid::Ulid;

type Result<T> = std::result::Result<T, Error>;

/// A line captured at confirmation time. Prices are snapshotted so later
/// menu edits don't rewrite order history.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderItem {
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub items: Json<Vec<OrderItem>>,
    pub total: BigDecimal,
    pub payment_ref: Option<String>,
    pub created_at: NaiveDateTime,
}

pub struct CreateOrderPayload {
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub total: BigDecimal,
    pub payment_ref: Option<String>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub type DynOrderStore = Arc<dyn OrderStore + Send + Sync>;

#[async_trait]
pub trait OrderStore {
    async fn create(&self, payload: CreateOrderPayload) -> Result<Order>;
    async fn list_by_customer(
        &self,
        customer_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Order>, u32)>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Order>>;
}

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, payload: CreateOrderPayload) -> Result<Order> {
        sqlx::query_as::<_, Order>(
            "
            INSERT INTO orders (id, customer_id, items, total, payment_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.customer_id)
        .bind(Json(payload.items))
        .bind(payload.total)
        .bind(payload.payment_ref)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while creating an order: {}", err);
            Error::UnexpectedError
        })
    }

    async fn list_by_customer(
        &self,
        customer_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<(Vec<Order>, u32)> {
        let orders = sqlx::query_as::<_, Order>(
            "
            SELECT * FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            ",
        )
        .bind(customer_id)
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while listing orders for customer {}: {}",
                customer_id,
                err
            );
            Error::UnexpectedError
        })?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while counting orders for customer {}: {}",
                customer_id,
                err
            );
            Error::UnexpectedError
        })?;

        Ok((orders, total as u32))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while fetching order {}: {}", id, err);
                Error::UnexpectedError
            })
    }
}
