use super::service;
use crate::{
    modules::auth::middleware::Auth,
    types::Context,
    utils::pagination::{Paginated, Pagination},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

async fn checkout(State(ctx): State<Arc<Context>>, auth: Auth) -> impl IntoResponse {
    match service::checkout(ctx, &auth.customer.id).await {
        Ok(details) => (StatusCode::OK, Json(json!(details))),
        Err(service::Error::EmptyCart) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Your cart is empty!" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Checkout failed" })),
        ),
    }
}

#[derive(Deserialize, Default)]
struct PlaceOrderPayload {
    payment_ref: Option<String>,
}

async fn place_order(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    payload: Option<Json<PlaceOrderPayload>>,
) -> impl IntoResponse {
    let payment_ref = payload.and_then(|Json(p)| p.payment_ref);

    match service::place_order(ctx, &auth.customer.id, payment_ref).await {
        Ok(order) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Order placed!",
                "order": order,
            })),
        ),
        Err(service::Error::EmptyCart) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Your cart is empty!" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to place order" })),
        ),
    }
}

async fn list_orders(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    pagination: Pagination,
) -> impl IntoResponse {
    match service::list_orders(
        ctx,
        &auth.customer.id,
        pagination.offset(),
        pagination.per_page,
    )
    .await
    {
        Ok((orders, total)) => (
            StatusCode::OK,
            Json(json!(Paginated::new(
                orders,
                total,
                pagination.page,
                pagination.per_page
            ))),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch orders" })),
        ),
    }
}

async fn get_order(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match service::find_order(ctx, &auth.customer.id, &id).await {
        Ok(Some(order)) => (StatusCode::OK, Json(json!(order))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Order not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch order" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/orders", post(place_order).get(list_orders))
        .route("/orders/:id", get(get_order))
}
