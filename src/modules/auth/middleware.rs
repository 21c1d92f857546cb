use super::service;
use crate::modules::user::repository::Customer;
use crate::types::Context;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::RequestPartsExt;
use axum::{async_trait, Json};
use axum::{extract::Extension, http, http::request::Parts, response::Response};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

enum Error {
    InvalidSession,
}

fn get_token_from_header(header: String) -> Result<String, Error> {
    header
        .split(' ')
        .nth(1)
        .map(|h| h.to_string())
        .ok_or(Error::InvalidSession)
}

async fn get_customer_from_header(ctx: Arc<Context>, header: String) -> Result<Customer, Error> {
    let access_token = get_token_from_header(header)?;
    service::auth::verify_access_token(ctx, &access_token)
        .await
        .map_err(|_| Error::InvalidSession)
}

async fn get_customer_from_request<State: Send + Sync>(
    ctx: Arc<Context>,
    parts: &mut Parts,
    _: &State,
) -> Result<Customer, Response> {
    let headers = parts.extract::<HeaderMap>().await.unwrap();

    let err = (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid session token"})),
    );

    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(err.clone().into_response())?;

    get_customer_from_header(ctx, auth_header.to_string())
        .await
        .map_err(|_| err.clone().into_response())
}

#[derive(Serialize, Clone)]
pub struct Auth {
    pub customer: Customer,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(ctx) = parts.extract::<Extension<Arc<Context>>>().await.unwrap();
        get_customer_from_request(ctx, parts, state)
            .await
            .map(|customer| Self { customer })
    }
}

#[derive(Serialize, Clone)]
pub struct AdminAuth {
    pub customer: Customer,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(ctx) = parts.extract::<Extension<Arc<Context>>>().await.unwrap();

        let customer = get_customer_from_request(ctx, parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Unauthorized" })),
                )
                    .into_response()
            })?;

        if !customer.is_staff && !customer.is_superuser {
            return Err(
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response(),
            );
        }

        Ok(Self { customer })
    }
}
