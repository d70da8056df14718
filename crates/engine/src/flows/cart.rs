//! Cart: add-with-quantity, viewing, and clearing.
//!
//! Adding goes through a one-question flow so the quantity is always an
//! explicit user choice. Repeat adds of the same product accumulate in
//! the store, not here.

use common::UserId;
use domain::{parse_quantity, ProductId};
use serde_json::json;
use store::{CartStore, CatalogStore, IdentityStore};

use crate::channel::{Button, Keyboard, MessageChannel};
use crate::error::Result;
use crate::registry::{ConversationState, FieldBag, FlowId, Step};
use crate::router::Router;
use crate::ui;
use crate::Action;

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub(crate) async fn begin_quantity(&self, user: UserId, id: ProductId) -> Result<()> {
        let Some(product) = self.catalog.find_by_id(id).await? else {
            self.channel
                .toast(user, "This product is no longer available.")
                .await?;
            return Ok(());
        };

        let mut fields = FieldBag::new();
        fields.insert("product_id", json!(id.as_i64()));
        self.registry
            .begin(user, FlowId::Quantity, Step::AwaitingQuantity, fields);

        let text = format!("{}\n{}", product.name, ui::QUANTITY_PROMPT);
        self.channel.send_text(user, &text, None).await?;
        Ok(())
    }

    pub(crate) async fn capture_quantity(
        &self,
        user: UserId,
        state: &ConversationState,
        text: &str,
    ) -> Result<()> {
        let Ok(quantity) = parse_quantity(text) else {
            self.channel.send_text(user, ui::BAD_QUANTITY, None).await?;
            return Ok(());
        };

        let Some(id) = state.fields.get_i64("product_id") else {
            // slot corrupted, treat it as gone
            self.registry.end(user);
            return self.fallback(user).await;
        };

        self.cart
            .add_or_accumulate(user, ProductId::new(id), quantity)
            .await?;
        self.registry.end(user);
        metrics::counter!("engine_cart_adds_total").increment(1);

        let kb = Keyboard::new().row(vec![
            Button::new("🛒 Cart", Action::ViewCart),
            Button::new("⬅️ Menu", Action::Menu),
        ]);
        self.channel
            .send_text(user, ui::ADDED_TO_CART, Some(&kb))
            .await?;
        Ok(())
    }

    pub(crate) async fn show_cart(&self, user: UserId) -> Result<()> {
        let lines = self.cart.list_for_user(user).await?;
        if lines.is_empty() {
            let kb = Keyboard::new().button("🛍 Products", Action::Products);
            self.channel.send_text(user, ui::EMPTY_CART, Some(&kb)).await?;
            return Ok(());
        }
        self.channel
            .send_text(user, &ui::cart_summary(&lines), Some(&ui::cart_controls()))
            .await?;
        Ok(())
    }

    pub(crate) async fn clear_cart(&self, user: UserId) -> Result<()> {
        self.cart.clear(user).await?;
        self.channel.send_text(user, ui::CART_CLEARED, None).await?;
        Ok(())
    }
}
