//! Product reference data.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by the product service or attached to a chat reply.
///
/// Products are reference data: the client never edits them, it only keeps
/// the most recently received copy per id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}
