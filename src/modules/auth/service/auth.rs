use chrono::{Duration, NaiveDateTime, Utc};
use std::sync::Arc;
use ulid::Ulid;

use crate::{
    modules::{
        auth::repository::{CreateSessionPayload, Session, UpdateSessionPayload},
        user::repository::Customer,
    },
    types::Context,
};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidToken,
    ExpiredToken,
    UnexpectedError,
}

fn access_token_expiry() -> NaiveDateTime {
    (Utc::now() + Duration::days(1)).naive_utc()
}

fn refresh_token_expiry() -> NaiveDateTime {
    (Utc::now() + Duration::days(30)).naive_utc()
}

pub async fn create_session(ctx: Arc<Context>, customer_id: String) -> Result<Session> {
    ctx.sessions
        .create(CreateSessionPayload {
            customer_id,
            access_token: Ulid::new().to_string(),
            refresh_token: Ulid::new().to_string(),
            access_token_expires_at: access_token_expiry(),
            refresh_token_expires_at: refresh_token_expiry(),
        })
        .await
        .map_err(|_| Error::UnexpectedError)
}

pub async fn verify_access_token(ctx: Arc<Context>, access_token: &str) -> Result<Customer> {
    let session = ctx
        .sessions
        .find_by_access_token(access_token)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidToken)?;

    if Utc::now().naive_utc() >= session.access_token_expires_at {
        return Err(Error::ExpiredToken);
    }

    ctx.customers
        .find_by_id(&session.customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidToken)
}

pub async fn refresh_session(ctx: Arc<Context>, refresh_token: &str) -> Result<Session> {
    let session = ctx
        .sessions
        .find_by_refresh_token(refresh_token)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidToken)?;

    if Utc::now().naive_utc() >= session.refresh_token_expires_at {
        return Err(Error::ExpiredToken);
    }

    ctx.sessions
        .update_tokens(
            &session.id,
            UpdateSessionPayload {
                access_token: Ulid::new().to_string(),
                refresh_token: Ulid::new().to_string(),
                access_token_expires_at: access_token_expiry(),
                refresh_token_expires_at: refresh_token_expiry(),
            },
        )
        .await
        .map_err(|_| Error::UnexpectedError)
}
