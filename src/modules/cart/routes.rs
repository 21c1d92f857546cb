use super::service;
use crate::{modules::auth::middleware::Auth, types::Context, utils::validation};
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
use validator::Validate;

async fn get_cart(State(ctx): State<Arc<Context>>, auth: Auth) -> impl IntoResponse {
    match service::view(ctx, &auth.customer.id).await {
        Ok(cart) => (StatusCode::OK, Json(json!(cart))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch cart" })),
        ),
    }
}

async fn add_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(menu_item_id): Path<String>,
) -> impl IntoResponse {
    match service::add(ctx, &auth.customer.id, &menu_item_id).await {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "quantity": result.quantity,
                "notices": result.notices,
            })),
        ),
        Err(service::Error::MenuItemNotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Menu item not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to add item to cart" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct UpdateQuantityPayload {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    quantity: i32,
}

async fn update_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(menu_item_id): Path<String>,
    Json(payload): Json<UpdateQuantityPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    match service::set_quantity(ctx, &auth.customer.id, &menu_item_id, payload.quantity).await {
        Ok(Some(notice)) => (StatusCode::OK, Json(json!({ "message": notice }))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Item not in cart" })),
        ),
        Err(service::Error::MenuItemNotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Menu item not found" })),
        ),
        Err(service::Error::InvalidQuantity) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Quantity must be at least 1" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update quantity" })),
        ),
    }
}

async fn remove_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(menu_item_id): Path<String>,
) -> impl IntoResponse {
    match service::remove(ctx, &auth.customer.id, &menu_item_id).await {
        Ok(Some(notice)) => (StatusCode::OK, Json(json!({ "message": notice }))),
        Ok(None) => (
            StatusCode::OK,
            Json(json!({ "message": "Item was not in your cart" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to remove item from cart" })),
        ),
    }
}

async fn clear_cart(State(ctx): State<Arc<Context>>, auth: Auth) -> impl IntoResponse {
    match service::clear(ctx, &auth.customer.id).await {
        Ok(notice) => (StatusCode::OK, Json(json!({ "message": notice }))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to clear cart" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route(
            "/items/:menu_item_id",
            post(add_item).put(update_item).delete(remove_item),
        )
}
