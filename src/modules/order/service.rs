use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Serialize;
use std::sync::Arc;

use super::repository::{CreateOrderPayload, Order, OrderItem};
use crate::{
    modules::cart::{self, service::CartViewItem},
    types::Context,
};

#[derive(Debug)]
pub enum Error {
    EmptyCart,
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize, Debug)]
pub struct CheckoutDetails {
    pub items: Vec<CartViewItem>,
    pub total: BigDecimal,
    pub amount_minor: i64,
    pub currency: String,
    pub gateway_order_id: String,
    pub key_id: String,
}

fn amount_in_minor_units(total: &BigDecimal) -> Result<i64> {
    (total * BigDecimal::from(100))
        .to_i64()
        .ok_or(Error::UnexpectedError)
}

/// Prices the cart and obtains a payment-order handle from the gateway.
/// On any gateway failure a locally generated placeholder handle is
/// substituted so the checkout can still proceed (degraded mode, no retry).
pub async fn checkout(ctx: Arc<Context>, customer_id: &str) -> Result<CheckoutDetails> {
    let cart = cart::service::view(ctx.clone(), customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    if cart.total_price == BigDecimal::from(0) {
        return Err(Error::EmptyCart);
    }

    let amount_minor = amount_in_minor_units(&cart.total_price)?;

    let gateway_order_id = match ctx
        .payment
        .gateway
        .create_order(amount_minor, &ctx.payment.currency)
        .await
    {
        Ok(order) => order.id,
        Err(_) => {
            tracing::warn!(
                "Payment gateway unavailable, issuing placeholder order for {} minor units",
                amount_minor
            );
            format!("test_order_{}", amount_minor)
        }
    };

    Ok(CheckoutDetails {
        items: cart.items,
        total: cart.total_price,
        amount_minor,
        currency: ctx.payment.currency.clone(),
        gateway_order_id,
        key_id: ctx.payment.key_id.clone(),
    })
}

/// Confirms the order: snapshots the cart's lines and total into a
/// persisted order, then empties the cart. The returned order carries the
/// pre-clear total.
pub async fn place_order(
    ctx: Arc<Context>,
    customer_id: &str,
    payment_ref: Option<String>,
) -> Result<Order> {
    let cart = cart::service::view(ctx.clone(), customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?;

    if cart.items.is_empty() {
        return Err(Error::EmptyCart);
    }

    let items = cart
        .items
        .iter()
        .map(|line| OrderItem {
            menu_item_id: line.menu_item.id.clone(),
            name: line.menu_item.name.clone(),
            unit_price: line.menu_item.price.clone(),
            quantity: line.quantity,
        })
        .collect();

    let order = ctx
        .orders
        .create(CreateOrderPayload {
            customer_id: customer_id.to_string(),
            items,
            total: cart.total_price,
            payment_ref,
        })
        .await
        .map_err(|_| Error::UnexpectedError)?;

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

    Ok(order)
}

pub async fn list_orders(
    ctx: Arc<Context>,
    customer_id: &str,
    offset: u32,
    limit: u32,
) -> Result<(Vec<Order>, u32)> {
    ctx.orders
        .list_by_customer(customer_id, offset, limit)
        .await
        .map_err(|_| Error::UnexpectedError)
}

/// An order is only visible to the customer who placed it.
pub async fn find_order(
    ctx: Arc<Context>,
    customer_id: &str,
    order_id: &str,
) -> Result<Option<Order>> {
    let order = ctx
        .orders
        .find_by_id(order_id)
        .await
        .map_err(|_| Error::UnexpectedError)?;
    Ok(order.filter(|order| order.customer_id == customer_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::repository::{MenuItemPayload, RestaurantPayload};
    use crate::modules::user::repository::CreateCustomerPayload;
    use crate::types::test_support::test_context;
    use std::str::FromStr;
    use std::sync::atomic::Ordering;

    async fn seed_menu_item(ctx: &Arc<Context>, price: &str) -> String {
        let restaurant = ctx
            .catalog
            .create_restaurant(RestaurantPayload {
                name: "Spice Villa".to_string(),
                picture: None,
                cuisine: "Indian".to_string(),
                rating: 4.5,
            })
            .await
            .unwrap();
        ctx.catalog
            .create_menu_item(
                &restaurant.id,
                MenuItemPayload {
                    name: "Paneer Tikka".to_string(),
                    picture: None,
                    description: "Grilled paneer".to_string(),
                    price: BigDecimal::from_str(price).unwrap(),
                    is_veg: true,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn checkout_of_empty_cart_makes_no_gateway_call() {
        let (ctx, handles) = test_context();
        let result = checkout(ctx.clone(), "cust-1").await;
        assert!(matches!(result, Err(Error::EmptyCart)));
        assert_eq!(handles.gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn checkout_uses_gateway_order_handle() {
        let (ctx, handles) = test_context();
        let item_id = seed_menu_item(&ctx, "12.99").await;
        cart::service::add(ctx.clone(), "cust-1", &item_id)
            .await
            .unwrap();

        let details = checkout(ctx.clone(), "cust-1").await.unwrap();
        assert_eq!(details.amount_minor, 1299);
        assert_eq!(details.gateway_order_id, "order_stub_1299");
        assert_eq!(handles.gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn checkout_falls_back_when_gateway_fails() {
        let (ctx, handles) = test_context();
        handles.gateway.fail.store(true, Ordering::SeqCst);
        let item_id = seed_menu_item(&ctx, "12.99").await;
        cart::service::add(ctx.clone(), "cust-1", &item_id)
            .await
            .unwrap();
        cart::service::add(ctx.clone(), "cust-1", &item_id)
            .await
            .unwrap();

        let details = checkout(ctx.clone(), "cust-1").await.unwrap();
        assert_eq!(details.gateway_order_id, "test_order_2598");
        assert_eq!(details.total, BigDecimal::from_str("25.98").unwrap());
    }

    #[tokio::test]
    async fn placing_an_order_snapshots_and_empties_the_cart() {
        let (ctx, _) = test_context();
        let customer = ctx
            .customers
            .create(CreateCustomerPayload {
                username: "alice".to_string(),
                password_hash: "x".to_string(),
                email: "alice@example.com".to_string(),
                mobile: Some("9876543210".to_string()),
                address: "1 Main St".to_string(),
                is_staff: false,
                is_superuser: false,
            })
            .await
            .unwrap();

        let item_id = seed_menu_item(&ctx, "12.99").await;
        cart::service::add(ctx.clone(), &customer.id, &item_id)
            .await
            .unwrap();
        cart::service::add(ctx.clone(), &customer.id, &item_id)
            .await
            .unwrap();

        let before = cart::service::view(ctx.clone(), &customer.id).await.unwrap();
        assert_eq!(before.total_items, 2);

        let order = place_order(ctx.clone(), &customer.id, None).await.unwrap();
        assert_eq!(order.total, BigDecimal::from_str("25.98").unwrap());
        assert_eq!(order.items.0.len(), 1);
        assert_eq!(order.items.0[0].quantity, 2);

        let after = cart::service::view(ctx.clone(), &customer.id).await.unwrap();
        assert!(after.items.is_empty());
        assert_eq!(after.total_price, BigDecimal::from(0));

        let (history, total) = list_orders(ctx.clone(), &customer.id, 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(history[0].id, order.id);
    }

    #[tokio::test]
    async fn an_order_is_only_visible_to_its_owner() {
        let (ctx, _) = test_context();
        let item_id = seed_menu_item(&ctx, "11.25").await;
        cart::service::add(ctx.clone(), "cust-1", &item_id)
            .await
            .unwrap();
        let order = place_order(ctx.clone(), "cust-1", None).await.unwrap();

        let found = find_order(ctx.clone(), "cust-1", &order.id).await.unwrap();
        assert_eq!(found.unwrap().id, order.id);
        assert!(find_order(ctx, "cust-2", &order.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn placing_an_order_with_an_empty_cart_is_rejected() {
        let (ctx, _) = test_context();
        assert!(matches!(
            place_order(ctx, "cust-1", None).await,
            Err(Error::EmptyCart)
        ));
    }
}
