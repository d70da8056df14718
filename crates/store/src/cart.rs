use async_trait::async_trait;
use common::UserId;
use domain::{CartLine, ProductId};

use crate::Result;

/// Per-user cart line items.
///
/// A (user, product) pair maps to a single line whose quantity
/// accumulates on repeat adds. Listing joins against the catalog, so a
/// line whose product was deleted after the add simply disappears.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds a product to the user's cart, accumulating the quantity if a
    /// line for that product already exists.
    async fn add_or_accumulate(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<()>;

    /// Lists the user's cart lines with current product data.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<CartLine>>;

    /// Removes every line for the user. Idempotent.
    async fn clear(&self, user: UserId) -> Result<()>;
}
