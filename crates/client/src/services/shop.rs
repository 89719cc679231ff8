//! Product listings and checkout.

use glt_core::{OrderConfirmation, Product};
use tracing::{info, instrument, warn};

use crate::api::{ApiError, ShopApi};
use crate::error::ClientError;
use crate::services::cart::CartStore;
use crate::services::catalog::ProductCatalog;
use crate::services::tokens::TokenStore;

/// Shop flow over a [`ShopApi`]: refresh the catalog, turn the cart into an order.
#[derive(Clone)]
pub struct ShopService<S: ShopApi + Clone> {
    api: S,
    cart: CartStore,
    catalog: ProductCatalog,
    tokens: TokenStore,
}

impl<S: ShopApi + Clone> ShopService<S> {
    #[must_use]
    pub fn new(api: S, cart: CartStore, catalog: ProductCatalog, tokens: TokenStore) -> Self {
        Self {
            api,
            cart,
            catalog,
            tokens,
        }
    }

    /// Fetch the product listing and merge it into the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the listing request fails.
    #[instrument(skip(self))]
    pub async fn refresh_products(&self) -> Result<Vec<Product>, ClientError> {
        let token = self.access_token()?;
        let products = self.api.products(&token).await?;
        self.catalog.upsert_all(products.iter().cloned());
        Ok(products)
    }

    /// Place an order for everything in the cart.
    ///
    /// Only after the order is confirmed are the ordered lines taken out of
    /// the cart; a failed order leaves it untouched. Items added while the
    /// order is in flight stay in the cart.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` if there is nothing to order, otherwise any
    /// authentication or API error.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<OrderConfirmation, ClientError> {
        let lines = self.cart.order_lines();
        if lines.is_empty() {
            return Err(ClientError::EmptyCart);
        }
        let token = self.access_token()?;

        match self.api.place_order(&token, &lines).await {
            Ok(confirmation) => {
                self.cart.remove_lines(&lines);
                info!(order_id = %confirmation.id, lines = lines.len(), "Order placed");
                Ok(confirmation)
            }
            Err(e) => {
                warn!(error = %e, "Order failed, cart kept");
                Err(e.into())
            }
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    fn access_token(&self) -> Result<String, ClientError> {
        self.tokens
            .access_token()
            .ok_or_else(|| ApiError::NotAuthenticated.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use glt_core::{OrderId, OrderLine, Price, ProductId};
    use tokio::sync::Notify;

    use super::*;
    use crate::services::tokens::AuthTokens;
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct FakeShop {
        fail: AtomicBool,
        started: AtomicBool,
        gate: Mutex<Option<Arc<Notify>>>,
        orders: Mutex<Vec<Vec<OrderLine>>>,
    }

    impl ShopApi for Arc<FakeShop> {
        async fn products(&self, _token: &str) -> Result<Vec<Product>, ApiError> {
            Ok(vec![Product {
                id: ProductId::new(3),
                title: "Breadboard".to_string(),
                description: String::new(),
                price: Price::from_cents(899),
                image_url: None,
                in_stock: true,
            }])
        }

        async fn place_order(
            &self,
            _token: &str,
            lines: &[OrderLine],
        ) -> Result<OrderConfirmation, ApiError> {
            self.started.store(true, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Api {
                    status: 400,
                    message: "Out of stock".to_string(),
                });
            }
            self.orders.lock().unwrap().push(lines.to_vec());
            Ok(OrderConfirmation {
                id: OrderId::new(1),
                status: Some("placed".to_string()),
                total: None,
                created_at: None,
                items: lines.to_vec(),
            })
        }
    }

    fn shop() -> (ShopService<Arc<FakeShop>>, Arc<FakeShop>) {
        let storage = Arc::new(MemoryStore::new());
        let tokens = TokenStore::load(storage.clone());
        tokens.set(AuthTokens::new("access", "refresh"));
        let api = Arc::new(FakeShop::default());
        let service = ShopService::new(
            api.clone(),
            CartStore::load(storage),
            ProductCatalog::new(),
            tokens,
        );
        (service, api)
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_order() {
        let (shop, api) = shop();
        let err = shop.place_order().await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyCart));
        assert!(api.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_order_clears_cart() {
        let (shop, api) = shop();
        shop.cart().set_quantity(ProductId::new(3), 2);

        let confirmation = shop.place_order().await.unwrap();
        assert_eq!(confirmation.items.len(), 1);
        assert!(shop.cart().is_empty());
        assert_eq!(api.orders.lock().unwrap()[0][0].quantity, 2);
    }

    #[tokio::test]
    async fn test_items_added_mid_order_are_kept() {
        let (shop, api) = shop();
        let gate = Arc::new(Notify::new());
        *api.gate.lock().unwrap() = Some(gate.clone());
        shop.cart().set_quantity(ProductId::new(1), 1);
        shop.cart().set_quantity(ProductId::new(3), 2);

        let placing = shop.clone();
        let pending = tokio::spawn(async move { placing.place_order().await });
        while !api.started.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        shop.cart().set_quantity(ProductId::new(2), 3);
        shop.cart().increment(ProductId::new(3));
        gate.notify_one();
        pending.await.unwrap().unwrap();

        assert_eq!(api.orders.lock().unwrap()[0].len(), 2);
        let left: Vec<_> = shop.cart().items().into_iter().collect();
        assert_eq!(left, [(ProductId::new(2), 3), (ProductId::new(3), 1)]);
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let (shop, api) = shop();
        api.fail.store(true, Ordering::SeqCst);
        shop.cart().set_quantity(ProductId::new(3), 2);

        let err = shop.place_order().await.unwrap_err();
        assert_eq!(err.user_message(), "Out of stock");
        assert_eq!(shop.cart().quantity(ProductId::new(3)), 2);
    }

    #[tokio::test]
    async fn test_refresh_products_fills_catalog() {
        let (shop, _) = shop();
        let products = shop.refresh_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert!(shop.catalog().get(ProductId::new(3)).is_some());
    }
}
