//! Persistent cart store.
//!
//! The cart maps product ids to positive quantities. Every mutation rewrites
//! the whole map to durable storage under [`keys::CART_ITEMS`]; there is no
//! incremental diffing. A failed write is logged and the in-memory cart keeps
//! the change, so the next successful write catches storage up.
//!
//! Invariant: no stored entry has a quantity of zero.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use glt_core::{OrderLine, Price, ProductId};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::services::catalog::ProductCatalog;
use crate::storage::{KeyValueStore, keys, load_json, save_json};

/// Snapshot of cart contents, ordered by product id.
pub type CartItems = BTreeMap<ProductId, u32>;

/// Cart store backed by durable storage.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn KeyValueStore>,
    items: Mutex<CartItems>,
    changes: watch::Sender<CartItems>,
}

impl CartStore {
    /// Open the cart, rehydrating whatever was persisted.
    ///
    /// Unreadable persisted data is discarded and the cart starts empty.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let items = match load_json::<CartItems>(storage.as_ref(), keys::CART_ITEMS) {
            Ok(Some(mut items)) => {
                items.retain(|_, quantity| *quantity > 0);
                items
            }
            Ok(None) => CartItems::new(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted cart");
                CartItems::new()
            }
        };
        debug!(entries = items.len(), "Cart loaded");

        let (changes, _) = watch::channel(items.clone());
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                items: Mutex::new(items),
                changes,
            }),
        }
    }

    /// Set the quantity for a product.
    ///
    /// Negative quantities are clamped to zero and zero removes the entry.
    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        self.mutate(|items| {
            if quantity == 0 {
                items.remove(&product_id);
            } else {
                items.insert(product_id, quantity);
            }
        });
    }

    /// Adjust a product's quantity by `delta` in a single mutation.
    ///
    /// The result is clamped to `0..=u32::MAX` and zero removes the entry.
    pub fn add(&self, product_id: ProductId, delta: i64) {
        self.mutate(|items| {
            let current = i64::from(items.get(&product_id).copied().unwrap_or(0));
            let quantity = u32::try_from(current.saturating_add(delta).max(0)).unwrap_or(u32::MAX);
            if quantity == 0 {
                items.remove(&product_id);
            } else {
                items.insert(product_id, quantity);
            }
        });
    }

    /// Add one unit of a product.
    pub fn increment(&self, product_id: ProductId) {
        self.add(product_id, 1);
    }

    /// Remove one unit of a product, dropping the entry at zero.
    pub fn decrement(&self, product_id: ProductId) {
        self.add(product_id, -1);
    }

    /// Take ordered lines out of the cart in one mutation.
    ///
    /// Anything added after the order was taken stays behind.
    pub fn remove_lines(&self, lines: &[OrderLine]) {
        self.mutate(|items| {
            for line in lines {
                if let Some(quantity) = items.get_mut(&line.product_id) {
                    *quantity = quantity.saturating_sub(line.quantity);
                    if *quantity == 0 {
                        items.remove(&line.product_id);
                    }
                }
            }
        });
    }

    /// Empty the cart with a single replace and a single write.
    pub fn clear(&self) {
        self.mutate(BTreeMap::clear);
    }

    /// Quantity currently held for a product (zero if absent).
    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> u32 {
        self.lock().get(&product_id).copied().unwrap_or(0)
    }

    /// Snapshot of the cart contents.
    #[must_use]
    pub fn items(&self) -> CartItems {
        self.lock().clone()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.lock().values().map(|&q| u64::from(q)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Price of everything in the cart that the catalog knows about.
    ///
    /// Entries whose product has not been seen this session are skipped.
    /// Returns `None` if the total does not fit in a [`Price`].
    #[must_use]
    pub fn subtotal(&self, catalog: &ProductCatalog) -> Option<Price> {
        self.lock()
            .iter()
            .filter_map(|(&id, &quantity)| catalog.get(id).map(|p| (p.price, quantity)))
            .try_fold(Price::ZERO, |total, (price, quantity)| {
                total.checked_add(price.checked_times(quantity)?)
            })
    }

    /// Cart contents as order lines.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lock()
            .iter()
            .map(|(&product_id, &quantity)| OrderLine {
                product_id,
                quantity,
            })
            .collect()
    }

    /// Receive a snapshot every time the cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartItems> {
        self.inner.changes.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CartItems> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change, persist the full map and notify subscribers.
    fn mutate(&self, change: impl FnOnce(&mut CartItems)) {
        let snapshot = {
            let mut items = self.lock();
            change(&mut items);
            if let Err(e) = save_json(self.inner.storage.as_ref(), keys::CART_ITEMS, &*items) {
                warn!(error = %e, "Failed to persist cart");
            }
            items.clone()
        };
        self.inner.changes.send_replace(snapshot);
    }
}
