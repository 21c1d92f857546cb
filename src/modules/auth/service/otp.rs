use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;

use crate::{
    modules::{
        auth::{
            repository::{CreateOtpPayload, Session},
            service,
        },
        notification::messages,
    },
    types::Context,
};

type Result<T> = std::result::Result<T, Error>;

pub const OTP_TTL_MINUTES: i64 = 10;

#[derive(Debug, PartialEq)]
pub enum Error {
    NotSent,
    InvalidOtp,
    UnexpectedError,
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

/// Issues a one-time code for the customer behind `mobile` and mails it.
/// An unknown mobile reports success all the same so the endpoint can not
/// be used to probe which numbers are registered.
pub async fn request(ctx: Arc<Context>, mobile: &str) -> Result<()> {
    let Some(customer) = ctx
        .customers
        .find_by_mobile(mobile)
        .await
        .map_err(|_| Error::UnexpectedError)?
    else {
        return Ok(());
    };

    let otp = ctx
        .otps
        .create(CreateOtpPayload {
            customer_id: customer.id.clone(),
            code: generate_code(),
            expires_at: (Utc::now() + Duration::minutes(OTP_TTL_MINUTES)).naive_utc(),
        })
        .await
        .map_err(|_| Error::UnexpectedError)?;

    let (subject, body) = messages::login_otp(&customer.username, &otp.code);
    ctx.mailer
        .send(&customer.email, &subject, &body)
        .await
        .map_err(|_| Error::NotSent)
}

/// Consumes the most recent outstanding code and opens a session.
pub async fn verify(ctx: Arc<Context>, mobile: &str, code: &str) -> Result<Session> {
    let customer = ctx
        .customers
        .find_by_mobile(mobile)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidOtp)?;

    let otp = ctx
        .otps
        .find_latest_unused(&customer.id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidOtp)?;

    if !otp.is_valid() || otp.code != code {
        return Err(Error::InvalidOtp);
    }

    ctx.otps
        .mark_used(&otp.id)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    service::auth::create_session(ctx, customer.id)
        .await
        .map_err(|_| Error::UnexpectedError)
}
