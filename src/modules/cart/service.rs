use bigdecimal::BigDecimal;
use serde::Serialize;
use std::sync::Arc;

use crate::{modules::catalog::repository::MenuItem, types::Context};

/// Flat delivery fee applied to any non-empty cart.
const DELIVERY_FEE: u32 = 30;

#[derive(Debug)]
pub enum Error {
    MenuItemNotFound,
    InvalidQuantity,
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize, Debug, Clone)]
pub struct CartViewItem {
    pub menu_item: MenuItem,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

#[derive(Serialize, Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartViewItem>,
    pub total_price: BigDecimal,
    pub total_items: i32,
    pub delivery_fee: BigDecimal,
    pub grand_total: BigDecimal,
}

impl CartView {
    fn empty() -> Self {
        Self {
            items: vec![],
            total_price: BigDecimal::from(0),
            total_items: 0,
            delivery_fee: BigDecimal::from(0),
            grand_total: BigDecimal::from(0),
        }
    }
}

#[derive(Debug)]
pub struct AddResult {
    pub quantity: i32,
    pub notices: Vec<String>,
}

/// The cart's lines joined with their menu items, with totals. An absent or
/// empty cart yields the zero view.
pub async fn view(ctx: Arc<Context>, customer_id: &str) -> Result<CartView> {
    let cart = ctx
        .carts
        .find_cart(customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    let cart = match cart {
        Some(cart) => cart,
        None => return Ok(CartView::empty()),
    };

    let lines = ctx
        .carts
        .list_items(&cart.id)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let menu_item = ctx
            .catalog
            .find_menu_item(&line.menu_item_id)
            .await
            .map_err(|_| Error::UnexpectedError)?;
        // Lines whose menu item has been deleted no longer count.
        if let Some(menu_item) = menu_item {
            let line_total = &menu_item.price * BigDecimal::from(line.quantity);
            items.push(CartViewItem {
                menu_item,
                quantity: line.quantity,
                line_total,
            });
        }
    }

    if items.is_empty() {
        return Ok(CartView::empty());
    }

    let total_price = items
        .iter()
        .fold(BigDecimal::from(0), |acc, i| acc + &i.line_total);
    let total_items: i32 = items.iter().map(|i| i.quantity).sum();
    let delivery_fee = BigDecimal::from(DELIVERY_FEE);
    let grand_total = &total_price + &delivery_fee;

    Ok(CartView {
        items,
        total_price,
        total_items,
        delivery_fee,
        grand_total,
    })
}

/// Adds one unit of the menu item to the customer's cart, clearing items
/// from any other restaurant first (last-restaurant-wins).
pub async fn add(ctx: Arc<Context>, customer_id: &str, menu_item_id: &str) -> Result<AddResult> {
    let menu_item = ctx
        .catalog
        .find_menu_item(menu_item_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::MenuItemNotFound)?;

    // Name of the restaurant about to be displaced, for the notice only.
    let displaced = match ctx
        .carts
        .find_cart(customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
    {
        Some(cart) => match cart.restaurant_id {
            Some(ref id) if id != &menu_item.restaurant_id => ctx
                .catalog
                .find_restaurant(id)
                .await
                .map_err(|_| Error::UnexpectedError)?
                .map(|r| r.name),
            _ => None,
        },
        None => None,
    };

    let outcome = ctx
        .carts
        .add_item(customer_id, &menu_item.id, &menu_item.restaurant_id)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    let mut notices = Vec::new();
    if outcome.cleared {
        let new_restaurant = ctx
            .catalog
            .find_restaurant(&menu_item.restaurant_id)
            .await
            .map_err(|_| Error::UnexpectedError)?
            .map(|r| r.name)
            .unwrap_or_default();
        notices.push(format!(
            "Cart cleared! Items from {} were removed to add items from {}.",
            displaced.unwrap_or_default(),
            new_restaurant,
        ));
    }
    if outcome.quantity == 1 {
        notices.push(format!("{} added to your cart!", menu_item.name));
    } else {
        notices.push(format!(
            "{} quantity updated to {}!",
            menu_item.name, outcome.quantity
        ));
    }

    Ok(AddResult {
        quantity: outcome.quantity,
        notices,
    })
}

/// Removes the line if present; a no-op (None) otherwise.
pub async fn remove(
    ctx: Arc<Context>,
    customer_id: &str,
    menu_item_id: &str,
) -> Result<Option<String>> {
    let cart = match ctx
        .carts
        .find_cart(customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
    {
        Some(cart) => cart,
        None => return Ok(None),
    };

    let removed = ctx
        .carts
        .remove_item(&cart.id, menu_item_id)
        .await
        .map_err(|_| Error::UnexpectedError)?;
    if !removed {
        return Ok(None);
    }

    let name = ctx
        .catalog
        .find_menu_item(menu_item_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .map(|m| m.name)
        .unwrap_or_default();
    Ok(Some(format!("{} removed from cart!", name)))
}

pub async fn set_quantity(
    ctx: Arc<Context>,
    customer_id: &str,
    menu_item_id: &str,
    quantity: i32,
) -> Result<Option<String>> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity);
    }

    let menu_item = ctx
        .catalog
        .find_menu_item(menu_item_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::MenuItemNotFound)?;

    let cart = match ctx
        .carts
        .find_cart(customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
    {
        Some(cart) => cart,
        None => return Ok(None),
    };

    let updated = ctx
        .carts
        .set_quantity(&cart.id, menu_item_id, quantity)
        .await
        .map_err(|_| Error::UnexpectedError)?;
    if !updated {
        return Ok(None);
    }

    Ok(Some(format!(
        "Updated {} quantity to {}",
        menu_item.name, quantity
    )))
}

pub async fn clear(ctx: Arc<Context>, customer_id: &str) -> Result<String> {
    if let Some(cart) = ctx
        .carts
        .find_cart(customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
    {
        ctx.carts
            .clear(&cart.id)
            .await
            .map_err(|_| Error::UnexpectedError)?;
    }
    Ok("Cart cleared successfully!".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::repository::{MenuItemPayload, Restaurant, RestaurantPayload};
    use crate::types::test_support::test_context;
    use std::str::FromStr;

    async fn seed_restaurant(ctx: &Arc<Context>, name: &str) -> Restaurant {
        ctx.catalog
            .create_restaurant(RestaurantPayload {
                name: name.to_string(),
                picture: None,
                cuisine: "Indian".to_string(),
                rating: 4.5,
            })
            .await
            .unwrap()
    }

    async fn seed_item(
        ctx: &Arc<Context>,
        restaurant: &Restaurant,
        name: &str,
        price: &str,
    ) -> MenuItem {
        ctx.catalog
            .create_menu_item(
                &restaurant.id,
                MenuItemPayload {
                    name: name.to_string(),
                    picture: None,
                    description: format!("{} description", name),
                    price: BigDecimal::from_str(price).unwrap(),
                    is_veg: true,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn adding_same_item_twice_aggregates_quantity() {
        let (ctx, _) = test_context();
        let restaurant = seed_restaurant(&ctx, "Spice Villa").await;
        let item = seed_item(&ctx, &restaurant, "Paneer Tikka", "12.99").await;

        let first = add(ctx.clone(), "cust-1", &item.id).await.unwrap();
        assert_eq!(first.quantity, 1);
        assert_eq!(first.notices, vec!["Paneer Tikka added to your cart!"]);

        let second = add(ctx.clone(), "cust-1", &item.id).await.unwrap();
        assert_eq!(second.quantity, 2);
        assert_eq!(
            second.notices,
            vec!["Paneer Tikka quantity updated to 2!"]
        );

        let cart_view = view(ctx.clone(), "cust-1").await.unwrap();
        assert_eq!(cart_view.items.len(), 1);
        assert_eq!(cart_view.items[0].quantity, 2);
        assert_eq!(
            cart_view.total_price,
            BigDecimal::from_str("25.98").unwrap()
        );
    }

    #[tokio::test]
    async fn at_most_one_cart_per_customer() {
        let (ctx, _) = test_context();
        let restaurant = seed_restaurant(&ctx, "Spice Villa").await;
        let a = seed_item(&ctx, &restaurant, "Dal", "4.00").await;
        let b = seed_item(&ctx, &restaurant, "Naan", "2.00").await;

        add(ctx.clone(), "cust-1", &a.id).await.unwrap();
        add(ctx.clone(), "cust-1", &b.id).await.unwrap();
        add(ctx.clone(), "cust-1", &a.id).await.unwrap();

        let cart = ctx.carts.find_cart("cust-1").await.unwrap().unwrap();
        assert_eq!(cart.customer_id, "cust-1");
        let items = ctx.carts.list_items(&cart.id).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn adding_from_another_restaurant_replaces_the_cart() {
        let (ctx, _) = test_context();
        let first = seed_restaurant(&ctx, "Spice Villa").await;
        let second = seed_restaurant(&ctx, "Pasta Point").await;
        let tikka = seed_item(&ctx, &first, "Paneer Tikka", "12.99").await;
        let pasta = seed_item(&ctx, &second, "Arrabbiata", "9.50").await;

        add(ctx.clone(), "cust-1", &tikka.id).await.unwrap();
        add(ctx.clone(), "cust-1", &tikka.id).await.unwrap();

        let result = add(ctx.clone(), "cust-1", &pasta.id).await.unwrap();
        assert_eq!(result.quantity, 1);
        assert_eq!(
            result.notices,
            vec![
                "Cart cleared! Items from Spice Villa were removed to add items from Pasta Point."
                    .to_string(),
                "Arrabbiata added to your cart!".to_string(),
            ]
        );

        let cart_view = view(ctx.clone(), "cust-1").await.unwrap();
        assert_eq!(cart_view.items.len(), 1);
        assert_eq!(cart_view.items[0].menu_item.id, pasta.id);
        assert_eq!(cart_view.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn totals_sum_over_lines() {
        let (ctx, _) = test_context();
        let restaurant = seed_restaurant(&ctx, "Spice Villa").await;
        let dal = seed_item(&ctx, &restaurant, "Dal", "4.50").await;
        let naan = seed_item(&ctx, &restaurant, "Naan", "2.25").await;

        add(ctx.clone(), "cust-1", &dal.id).await.unwrap();
        add(ctx.clone(), "cust-1", &dal.id).await.unwrap();
        add(ctx.clone(), "cust-1", &naan.id).await.unwrap();

        let cart_view = view(ctx.clone(), "cust-1").await.unwrap();
        // 2 * 4.50 + 1 * 2.25
        assert_eq!(
            cart_view.total_price,
            BigDecimal::from_str("11.25").unwrap()
        );
        assert_eq!(cart_view.total_items, 3);
        assert_eq!(cart_view.delivery_fee, BigDecimal::from(30));
        assert_eq!(
            cart_view.grand_total,
            BigDecimal::from_str("41.25").unwrap()
        );
    }

    #[tokio::test]
    async fn absent_and_empty_carts_total_zero() {
        let (ctx, _) = test_context();
        let absent = view(ctx.clone(), "nobody").await.unwrap();
        assert_eq!(absent.total_price, BigDecimal::from(0));
        assert_eq!(absent.total_items, 0);
        assert_eq!(absent.delivery_fee, BigDecimal::from(0));

        let restaurant = seed_restaurant(&ctx, "Spice Villa").await;
        let dal = seed_item(&ctx, &restaurant, "Dal", "4.50").await;
        add(ctx.clone(), "cust-1", &dal.id).await.unwrap();
        clear(ctx.clone(), "cust-1").await.unwrap();

        let emptied = view(ctx.clone(), "cust-1").await.unwrap();
        assert_eq!(emptied.total_price, BigDecimal::from(0));
        assert_eq!(emptied.total_items, 0);
    }

    #[tokio::test]
    async fn remove_and_set_quantity() {
        let (ctx, _) = test_context();
        let restaurant = seed_restaurant(&ctx, "Spice Villa").await;
        let dal = seed_item(&ctx, &restaurant, "Dal", "4.50").await;

        add(ctx.clone(), "cust-1", &dal.id).await.unwrap();

        let notice = set_quantity(ctx.clone(), "cust-1", &dal.id, 5)
            .await
            .unwrap();
        assert_eq!(notice.as_deref(), Some("Updated Dal quantity to 5"));
        let cart_view = view(ctx.clone(), "cust-1").await.unwrap();
        assert_eq!(cart_view.total_items, 5);

        assert!(matches!(
            set_quantity(ctx.clone(), "cust-1", &dal.id, 0).await,
            Err(Error::InvalidQuantity)
        ));

        let notice = remove(ctx.clone(), "cust-1", &dal.id).await.unwrap();
        assert_eq!(notice.as_deref(), Some("Dal removed from cart!"));
        // removing again is a no-op
        let notice = remove(ctx.clone(), "cust-1", &dal.id).await.unwrap();
        assert!(notice.is_none());
    }
}
