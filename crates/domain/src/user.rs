//! User and cart types.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::product::Product;

/// A registered user of the shop.
///
/// Created once on first observed interaction; never mutated or deleted
/// by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user record registered now.
    pub fn new(id: UserId, name: impl Into<String>, handle: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            handle,
            created_at: Utc::now(),
        }
    }
}

/// One line of a user's cart: a product plus its accumulated quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Creates a cart line.
    pub fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// Returns the total price for this line (quantity * unit price).
    pub fn total_price(&self) -> Money {
        self.product.price.multiply(self.quantity)
    }
}
