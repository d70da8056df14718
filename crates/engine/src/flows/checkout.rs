//! Checkout: snapshot the cart, collect a name and phone, then hand
//! the order to the operators.
//!
//! The cart is snapshotted into the slot when checkout begins, so what
//! the user confirms is what the operators see even if the catalog
//! changes mid-flow. Operator notification tolerates per-recipient
//! failures; one unreachable operator must not lose the order for the
//! rest.

use common::{MessageId, UserId};
use domain::{parse_phone, CartLine};
use serde_json::json;
use store::{CartStore, CatalogStore, IdentityStore};

use crate::channel::MessageChannel;
use crate::error::Result;
use crate::event::Sender;
use crate::registry::{ConversationState, FieldBag, FlowId, Step};
use crate::router::Router;
use crate::ui;

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub(crate) async fn begin_checkout(&self, user: UserId, origin: MessageId) -> Result<()> {
        let lines = self.cart.list_for_user(user).await?;
        if lines.is_empty() {
            self.channel.send_text(user, ui::EMPTY_CART, None).await?;
            return Ok(());
        }

        let mut fields = FieldBag::new();
        fields.insert("lines", serde_json::to_value(&lines)?);
        self.registry
            .begin(user, FlowId::Checkout, Step::AwaitingName, fields);

        // retire the cart keyboard so checkout can't be double-pressed
        self.channel.edit_controls(user, origin, None).await?;
        self.channel
            .send_text(user, ui::CHECKOUT_NAME_PROMPT, None)
            .await?;
        Ok(())
    }

    pub(crate) async fn capture_order_name(&self, user: UserId, text: &str) -> Result<()> {
        let mut patch = FieldBag::new();
        patch.insert("name", json!(text.trim()));
        self.registry.advance(user, Step::AwaitingPhone, patch)?;
        self.channel
            .send_text(user, ui::CHECKOUT_PHONE_PROMPT, None)
            .await?;
        Ok(())
    }

    pub(crate) async fn capture_order_phone(
        &self,
        customer: &Sender,
        state: &ConversationState,
        text: &str,
    ) -> Result<()> {
        let user = customer.id;
        let Ok(phone) = parse_phone(text) else {
            self.channel.send_text(user, ui::BAD_PHONE, None).await?;
            return Ok(());
        };

        let name = state.fields.get_str("name").unwrap_or("").to_string();
        let lines: Vec<CartLine> = match state.fields.get("lines") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Vec::new(),
        };
        self.registry.end(user);

        let notice = ui::order_notice(&name, &phone, user, customer.handle.as_deref(), &lines);
        for operator in &self.config.operators {
            if let Err(err) = self.channel.send_text(*operator, &notice, None).await {
                tracing::warn!(operator = %operator, error = %err, "order notice not delivered");
            }
        }

        self.cart.clear(user).await?;
        metrics::counter!("engine_orders_total").increment(1);
        tracing::info!(%user, line_count = lines.len(), "order placed");

        self.channel.send_text(user, ui::ORDER_PLACED, None).await?;
        Ok(())
    }
}
