use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use ulid::Ulid;

type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub customer_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

pub struct CreateSessionPayload {
    pub customer_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
}

pub struct UpdateSessionPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token_expires_at: NaiveDateTime,
}

/// One-time login code. Several may be outstanding per customer; only the
/// most recent unused one is consulted at verification.
#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Otp {
    pub id: String,
    pub customer_id: String,
    pub code: String,
    pub is_used: bool,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Otp {
    pub fn is_valid(&self) -> bool {
        !self.is_used && Utc::now().naive_utc() < self.expires_at
    }
}

pub struct CreateOtpPayload {
    pub customer_id: String,
    pub code: String,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub type DynSessionStore = Arc<dyn SessionStore + Send + Sync>;

#[async_trait]
pub trait SessionStore {
    async fn create(&self, payload: CreateSessionPayload) -> Result<Session>;
    async fn find_by_access_token(&self, access_token: &str) -> Result<Option<Session>>;
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>>;
    async fn update_tokens(&self, id: &str, payload: UpdateSessionPayload) -> Result<Session>;
}

pub type DynOtpStore = Arc<dyn OtpStore + Send + Sync>;

#[async_trait]
pub trait OtpStore {
    async fn create(&self, payload: CreateOtpPayload) -> Result<Otp>;
    async fn find_latest_unused(&self, customer_id: &str) -> Result<Option<Otp>>;
    async fn mark_used(&self, id: &str) -> Result<()>;
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, payload: CreateSessionPayload) -> Result<Session> {
        sqlx::query_as::<_, Session>(
            "
            INSERT INTO sessions (
                id,
                customer_id,
                access_token,
                refresh_token,
                access_token_expires_at,
                refresh_token_expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.customer_id)
        .bind(payload.access_token)
        .bind(payload.refresh_token)
        .bind(payload.access_token_expires_at)
        .bind(payload.refresh_token_expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while creating a session: {}", err);
            Error::UnexpectedError
        })
    }

    async fn find_by_access_token(&self, access_token: &str) -> Result<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE access_token = $1")
            .bind(access_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while fetching session by access token: {}", err);
                Error::UnexpectedError
            })
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE refresh_token = $1")
            .bind(refresh_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while fetching session by refresh token: {}",
                    err
                );
                Error::UnexpectedError
            })
    }

    async fn update_tokens(&self, id: &str, payload: UpdateSessionPayload) -> Result<Session> {
        sqlx::query_as::<_, Session>(
            "
            UPDATE sessions SET
                access_token = $1,
                refresh_token = $2,
                access_token_expires_at = $3,
                refresh_token_expires_at = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            ",
        )
        .bind(payload.access_token)
        .bind(payload.refresh_token)
        .bind(payload.access_token_expires_at)
        .bind(payload.refresh_token_expires_at)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while rotating session {}: {}", id, err);
            Error::UnexpectedError
        })
    }
}

pub struct PgOtpStore {
    pool: PgPool,
}

impl PgOtpStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for PgOtpStore {
    async fn create(&self, payload: CreateOtpPayload) -> Result<Otp> {
        sqlx::query_as::<_, Otp>(
            "
            INSERT INTO otps (id, customer_id, code, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.customer_id)
        .bind(payload.code)
        .bind(payload.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while creating an OTP: {}", err);
            Error::UnexpectedError
        })
    }

    async fn find_latest_unused(&self, customer_id: &str) -> Result<Option<Otp>> {
        sqlx::query_as::<_, Otp>(
            "
            SELECT * FROM otps
            WHERE customer_id = $1 AND is_used = FALSE
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(
                "Error occurred while fetching latest OTP for customer {}: {}",
                customer_id,
                err
            );
            Error::UnexpectedError
        })
    }

    async fn mark_used(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE otps SET is_used = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|err| {
                tracing::error!("Error occurred while consuming OTP {}: {}", id, err);
                Error::UnexpectedError
            })
    }
}
