use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use ulid::Ulid;

type Result<T> = std::result::Result<T, Error>;

pub const RESTAURANT_PICTURE_PLACEHOLDER: &str =
    "https://cwdaust.com.au/wpress/wp-content/uploads/2015/04/placeholder-restaurant.png";
pub const MENU_ITEM_PICTURE_PLACEHOLDER: &str =
    "https://cdn-icons-png.flaticon.com/512/1147/1147856.png";

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub picture: String,
    pub cuisine: String,
    pub rating: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub picture: String,
    pub description: String,
    pub price: BigDecimal,
    pub is_veg: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

pub struct RestaurantPayload {
    pub name: String,
    pub picture: Option<String>,
    pub cuisine: String,
    pub rating: f64,
}

pub struct MenuItemPayload {
    pub name: String,
    pub picture: Option<String>,
    pub description: String,
    pub price: BigDecimal,
    pub is_veg: bool,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub type DynCatalogStore = Arc<dyn CatalogStore + Send + Sync>;

#[async_trait]
pub trait CatalogStore {
    async fn create_restaurant(&self, payload: RestaurantPayload) -> Result<Restaurant>;
    async fn list_restaurants(&self, offset: u32, limit: u32) -> Result<(Vec<Restaurant>, u32)>;
    async fn find_restaurant(&self, id: &str) -> Result<Option<Restaurant>>;
    async fn update_restaurant(&self, id: &str, payload: RestaurantPayload) -> Result<()>;
    async fn delete_restaurant(&self, id: &str) -> Result<()>;
    async fn create_menu_item(
        &self,
        restaurant_id: &str,
        payload: MenuItemPayload,
    ) -> Result<MenuItem>;
    async fn list_menu_items(&self, restaurant_id: &str) -> Result<Vec<MenuItem>>;
    async fn find_menu_item(&self, id: &str) -> Result<Option<MenuItem>>;
    async fn update_menu_item(&self, id: &str, payload: MenuItemPayload) -> Result<()>;
    async fn delete_menu_item(&self, id: &str) -> Result<()>;
}

pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unexpected(context: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |err| {
        tracing::error!("Error occurred while {}: {}", context, err);
        Error::UnexpectedError
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn create_restaurant(&self, payload: RestaurantPayload) -> Result<Restaurant> {
        sqlx::query_as::<_, Restaurant>(
            "
            INSERT INTO restaurants (id, name, picture, cuisine, rating)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.name)
        .bind(
            payload
                .picture
                .unwrap_or_else(|| RESTAURANT_PICTURE_PLACEHOLDER.to_string()),
        )
        .bind(payload.cuisine)
        .bind(payload.rating)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected("creating a restaurant"))
    }

    async fn list_restaurants(&self, offset: u32, limit: u32) -> Result<(Vec<Restaurant>, u32)> {
        let restaurants = sqlx::query_as::<_, Restaurant>(
            "SELECT * FROM restaurants ORDER BY name OFFSET $1 LIMIT $2",
        )
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected("listing restaurants"))?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM restaurants")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected("counting restaurants"))?;

        Ok((restaurants, total as u32))
    }

    async fn find_restaurant(&self, id: &str) -> Result<Option<Restaurant>> {
        sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("fetching a restaurant"))
    }

    async fn update_restaurant(&self, id: &str, payload: RestaurantPayload) -> Result<()> {
        sqlx::query(
            "
            UPDATE restaurants SET
                name = $1,
                picture = COALESCE($2, picture),
                cuisine = $3,
                rating = $4,
                updated_at = NOW()
            WHERE id = $5
            ",
        )
        .bind(payload.name)
        .bind(payload.picture)
        .bind(payload.cuisine)
        .bind(payload.rating)
        .bind(id)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(unexpected("updating a restaurant"))
    }

    async fn delete_restaurant(&self, id: &str) -> Result<()> {
        // menu_items cascade with the restaurant
        sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(unexpected("deleting a restaurant"))
    }

    async fn create_menu_item(
        &self,
        restaurant_id: &str,
        payload: MenuItemPayload,
    ) -> Result<MenuItem> {
        sqlx::query_as::<_, MenuItem>(
            "
            INSERT INTO menu_items (id, restaurant_id, name, picture, description, price, is_veg)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(restaurant_id)
        .bind(payload.name)
        .bind(
            payload
                .picture
                .unwrap_or_else(|| MENU_ITEM_PICTURE_PLACEHOLDER.to_string()),
        )
        .bind(payload.description)
        .bind(payload.price)
        .bind(payload.is_veg)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected("creating a menu item"))
    }

    async fn list_menu_items(&self, restaurant_id: &str) -> Result<Vec<MenuItem>> {
        sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE restaurant_id = $1 ORDER BY created_at",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected("listing menu items"))
    }

    async fn find_menu_item(&self, id: &str) -> Result<Option<MenuItem>> {
        sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("fetching a menu item"))
    }

    async fn update_menu_item(&self, id: &str, payload: MenuItemPayload) -> Result<()> {
        sqlx::query(
            "
            UPDATE menu_items SET
                name = $1,
                picture = COALESCE($2, picture),
                description = $3,
                price = $4,
                is_veg = $5,
                updated_at = NOW()
            WHERE id = $6
            ",
        )
        .bind(payload.name)
        .bind(payload.picture)
        .bind(payload.description)
        .bind(payload.price)
        .bind(payload.is_veg)
        .bind(id)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(unexpected("updating a menu item"))
    }

    async fn delete_menu_item(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(unexpected("deleting a menu item"))
    }
}
