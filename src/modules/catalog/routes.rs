use super::repository::{MenuItemPayload, RestaurantPayload};
use crate::{
    modules::auth::middleware::AdminAuth,
    types::Context,
    utils::{
        pagination::{Paginated, Pagination},
        validation,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

#[derive(Deserialize, Validate)]
struct RestaurantBody {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(url(message = "Picture must be a URL"))]
    picture: Option<String>,
    #[validate(length(min = 1, message = "Cuisine is required"))]
    cuisine: String,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    rating: f64,
}

impl From<RestaurantBody> for RestaurantPayload {
    fn from(body: RestaurantBody) -> Self {
        Self {
            name: body.name,
            picture: body.picture,
            cuisine: body.cuisine,
            rating: body.rating,
        }
    }
}

fn default_is_veg() -> bool {
    true
}

#[derive(Deserialize, Validate)]
struct MenuItemBody {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(url(message = "Picture must be a URL"))]
    picture: Option<String>,
    description: String,
    price: BigDecimal,
    #[serde(default = "default_is_veg")]
    is_veg: bool,
}

impl From<MenuItemBody> for MenuItemPayload {
    fn from(body: MenuItemBody) -> Self {
        Self {
            name: body.name,
            picture: body.picture,
            description: body.description,
            price: body.price,
            is_veg: body.is_veg,
        }
    }
}

async fn list_restaurants(
    State(ctx): State<Arc<Context>>,
    pagination: Pagination,
) -> impl IntoResponse {
    match ctx
        .catalog
        .list_restaurants(pagination.offset(), pagination.per_page)
        .await
    {
        Ok((restaurants, total)) => (
            StatusCode::OK,
            Json(json!(Paginated::new(
                restaurants,
                total,
                pagination.page,
                pagination.per_page
            ))),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurants" })),
        ),
    }
}

async fn create_restaurant(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Json(body): Json<RestaurantBody>,
) -> impl IntoResponse {
    if let Err(errors) = body.validate() {
        return validation::into_response(errors);
    }

    match ctx.catalog.create_restaurant(body.into()).await {
        Ok(restaurant) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Restaurant created!",
                "restaurant": restaurant,
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create restaurant" })),
        ),
    }
}

async fn get_restaurant(
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match ctx.catalog.find_restaurant(&id).await {
        Ok(Some(restaurant)) => (StatusCode::OK, Json(json!(restaurant))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Restaurant not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch restaurant" })),
        ),
    }
}

async fn update_restaurant(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<RestaurantBody>,
) -> impl IntoResponse {
    if let Err(errors) = body.validate() {
        return validation::into_response(errors);
    }

    match ctx.catalog.find_restaurant(&id).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            )
        }
    }

    match ctx.catalog.update_restaurant(&id, body.into()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Restaurant updated!" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update restaurant" })),
        ),
    }
}

async fn delete_restaurant(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match ctx.catalog.find_restaurant(&id).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            )
        }
    }

    match ctx.catalog.delete_restaurant(&id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Restaurant deleted!" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete restaurant" })),
        ),
    }
}

async fn get_menu(State(ctx): State<Arc<Context>>, Path(id): Path<String>) -> impl IntoResponse {
    let restaurant = match ctx.catalog.find_restaurant(&id).await {
        Ok(Some(restaurant)) => restaurant,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            )
        }
    };

    match ctx.catalog.list_menu_items(&id).await {
        Ok(menu_items) => (
            StatusCode::OK,
            Json(json!({
                "restaurant": restaurant,
                "menu_items": menu_items,
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch menu" })),
        ),
    }
}

async fn create_menu_item(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<MenuItemBody>,
) -> impl IntoResponse {
    if let Err(errors) = body.validate() {
        return validation::into_response(errors);
    }

    match ctx.catalog.find_restaurant(&id).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Restaurant not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch restaurant" })),
            )
        }
    }

    match ctx.catalog.create_menu_item(&id, body.into()).await {
        Ok(menu_item) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Menu item created!",
                "menu_item": menu_item,
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create menu item" })),
        ),
    }
}

async fn update_menu_item(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<MenuItemBody>,
) -> impl IntoResponse {
    if let Err(errors) = body.validate() {
        return validation::into_response(errors);
    }

    match ctx.catalog.find_menu_item(&id).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Menu item not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch menu item" })),
            )
        }
    }

    match ctx.catalog.update_menu_item(&id, body.into()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Menu item updated!" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update menu item" })),
        ),
    }
}

async fn delete_menu_item(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match ctx.catalog.find_menu_item(&id).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Menu item not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch menu item" })),
            )
        }
    }

    match ctx.catalog.delete_menu_item(&id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Menu item deleted!" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete menu item" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/restaurants", get(list_restaurants).post(create_restaurant))
        .route(
            "/restaurants/:id",
            get(get_restaurant)
                .put(update_restaurant)
                .delete(delete_restaurant),
        )
        .route("/restaurants/:id/menu", get(get_menu).post(create_menu_item))
        .route(
            "/menu/:id",
            put(update_menu_item).delete(delete_menu_item),
        )
}
