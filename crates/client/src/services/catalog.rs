//! Session-wide product catalog.
//!
//! Products arrive from chat replies and from product listings. The catalog
//! keeps one copy per id and the most recently received copy wins; products
//! are reference data, so a racing overwrite is harmless.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use glt_core::{Product, ProductId};
use tracing::debug;

/// De-duplicated product catalog shared by the chat and shop flows.
#[derive(Clone, Default)]
pub struct ProductCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl ProductCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace products by id. Returns how many were merged.
    pub fn upsert_all(&self, products: impl IntoIterator<Item = Product>) -> usize {
        let mut map = self
            .products
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut merged = 0;
        for product in products {
            map.insert(product.id, product);
            merged += 1;
        }
        if merged > 0 {
            debug!(merged, total = map.len(), "Merged products into catalog");
        }
        merged
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// All known products, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glt_core::Price;

    use super::*;

    fn product(id: i64, title: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: String::new(),
            price: Price::from_cents(cents),
            image_url: None,
            in_stock: true,
        }
    }

    #[test]
    fn test_last_write_wins() {
        let catalog = ProductCatalog::new();
        catalog.upsert_all([product(1, "Old title", 100), product(2, "Mug", 1200)]);
        catalog.upsert_all([product(1, "New title", 150)]);

        let first = catalog.get(ProductId::new(1)).unwrap();
        assert_eq!(first.title, "New title");
        assert_eq!(first.price, Price::from_cents(150));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_all_is_sorted_by_id() {
        let catalog = ProductCatalog::new();
        catalog.upsert_all([product(9, "c", 1), product(3, "a", 1), product(5, "b", 1)]);
        let ids: Vec<i64> = catalog.all().iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, [3, 5, 9]);
    }

    #[test]
    fn test_clones_share_state() {
        let catalog = ProductCatalog::new();
        let other = catalog.clone();
        assert_eq!(other.upsert_all(Vec::new()), 0);
        other.upsert_all([product(4, "Stickers", 300)]);
        assert!(catalog.get(ProductId::new(4)).is_some());
        assert!(!catalog.is_empty());
    }
}
