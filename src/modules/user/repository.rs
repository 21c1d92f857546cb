use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use ulid::Ulid;

type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Customer {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub mobile: Option<String>,
    pub address: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

pub struct CreateCustomerPayload {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub mobile: Option<String>,
    pub address: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub type DynCustomerStore = Arc<dyn CustomerStore + Send + Sync>;

#[async_trait]
pub trait CustomerStore {
    async fn create(&self, payload: CreateCustomerPayload) -> Result<Customer>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Customer>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>>;
    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Customer>>;
    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<()>;
}

pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn create(&self, payload: CreateCustomerPayload) -> Result<Customer> {
        sqlx::query_as::<_, Customer>(
            "
            INSERT INTO customers (id, username, password_hash, email, mobile, address, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.username)
        .bind(payload.password_hash)
        .bind(payload.email)
        .bind(payload.mobile)
        .bind(payload.address)
        .bind(payload.is_staff)
        .bind(payload.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while creating a customer account: {}", err);
            Error::UnexpectedError
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while fetching customer by id {}: {}",
                    id,
                    err
                );
                Error::UnexpectedError
            })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while fetching customer by username {}: {}",
                    username,
                    err
                );
                Error::UnexpectedError
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while fetching customer by email: {}", err);
                Error::UnexpectedError
            })
    }

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE mobile = $1")
            .bind(mobile)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while fetching customer by mobile: {}", err);
                Error::UnexpectedError
            })
    }

    async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE customers SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while updating password for customer {}: {}",
                    id,
                    err
                );
                Error::UnexpectedError
            })
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use chrono::Utc;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryCustomerStore {
        rows: RwLock<Vec<Customer>>,
    }

    #[async_trait]
    impl CustomerStore for MemoryCustomerStore {
        async fn create(&self, payload: CreateCustomerPayload) -> Result<Customer> {
            let mut rows = self.rows.write().await;
            let duplicate = rows.iter().any(|c| {
                c.username == payload.username
                    || c.email == payload.email
                    || (payload.mobile.is_some() && c.mobile == payload.mobile)
            });
            if duplicate {
                return Err(Error::UnexpectedError);
            }
            let customer = Customer {
                id: Ulid::new().to_string(),
                username: payload.username,
                password_hash: payload.password_hash,
                email: payload.email,
                mobile: payload.mobile,
                address: payload.address,
                is_staff: payload.is_staff,
                is_superuser: payload.is_superuser,
                created_at: Utc::now().naive_utc(),
                updated_at: None,
            };
            rows.push(customer.clone());
            Ok(customer)
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Customer>> {
            Ok(self.rows.read().await.iter().find(|c| c.id == id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<Customer>> {
            Ok(self
                .rows
                .read()
                .await
                .iter()
                .find(|c| c.username == username)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
            Ok(self
                .rows
                .read()
                .await
                .iter()
                .find(|c| c.email == email)
                .cloned())
        }

        async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Customer>> {
            Ok(self
                .rows
                .read()
                .await
                .iter()
                .find(|c| c.mobile.as_deref() == Some(mobile))
                .cloned())
        }

        async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<()> {
            let mut rows = self.rows.write().await;
            if let Some(customer) = rows.iter_mut().find(|c| c.id == id) {
                customer.password_hash = password_hash.to_string();
                customer.updated_at = Some(Utc::now().naive_utc());
            }
            Ok(())
        }
    }
}
