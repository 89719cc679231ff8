//! Cart, product listing and checkout.

#![allow(clippy::print_stdout)]

use glt_client::ClientState;
use glt_core::ProductId;

use crate::CliError;

pub fn add(state: &ClientState, product_id: ProductId, quantity: u32) {
    state.cart().add(product_id, i64::from(quantity));
    print_count(state);
}

pub fn set(state: &ClientState, product_id: ProductId, quantity: i64) {
    state.cart().set_quantity(product_id, quantity);
    print_count(state);
}

pub fn remove(state: &ClientState, product_id: ProductId) {
    state.cart().decrement(product_id);
    print_count(state);
}

pub fn clear(state: &ClientState) {
    state.cart().clear();
    print_count(state);
}

pub async fn show(state: &ClientState) {
    let items = state.cart().items();
    if items.is_empty() {
        println!("Cart is empty");
        return;
    }

    // Prices come from the catalog, which starts empty in a fresh process
    if state.session().is_authenticated()
        && let Err(e) = state.shop().refresh_products().await
    {
        tracing::warn!(error = %e, "Could not load prices");
    }

    for (id, quantity) in &items {
        match state.catalog().get(*id) {
            Some(product) => println!(
                "{quantity} x #{id} {} @ {} = {}",
                product.title,
                product.price,
                product.price * *quantity
            ),
            None => println!("{quantity} x #{id}"),
        }
    }
    match state.cart().subtotal(state.catalog()) {
        Some(subtotal) => println!("Subtotal: {subtotal}"),
        None => println!("Subtotal: too large to display"),
    }
    print_count(state);
}

pub async fn products(state: &ClientState) -> Result<(), CliError> {
    for product in state.shop().refresh_products().await? {
        let stock = if product.in_stock { "" } else { " (out of stock)" };
        println!("#{} {} {}{stock}", product.id, product.title, product.price);
    }
    Ok(())
}

pub async fn checkout(state: &ClientState) -> Result<(), CliError> {
    let order = state.shop().place_order().await?;
    match order.total {
        Some(total) => println!("Order #{} placed, total {total}", order.id),
        None => println!("Order #{} placed", order.id),
    }
    Ok(())
}

fn print_count(state: &ClientState) {
    println!("{} item(s) in cart", state.cart().total_item_count());
}
