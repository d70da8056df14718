//! Operator flow: remove a product from the catalog.
//!
//! The listing is numbered and every number button carries the product
//! id, so a press deletes exactly the product it was rendered for even
//! if the listing went stale. One selection deletes one product and
//! ends the flow; there is no undo.

use common::UserId;
use store::{CartStore, CatalogStore, IdentityStore};

use crate::action::Action;
use crate::channel::MessageChannel;
use crate::error::Result;
use crate::event::{EventKind, InboundEvent};
use crate::registry::{FieldBag, FlowId, Step};
use crate::router::Router;
use crate::ui;

const CATEGORY_PROMPT: &str = "Which category?";

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub(crate) async fn begin_remove_product(&self, user: UserId) -> Result<()> {
        self.registry.begin(
            user,
            FlowId::RemoveProduct,
            Step::ChoosingRemovalCategory,
            FieldBag::new(),
        );
        self.channel
            .send_text(user, CATEGORY_PROMPT, Some(&ui::category_picker()))
            .await?;
        Ok(())
    }

    pub(crate) async fn remove_product_step(
        &self,
        event: &InboundEvent,
        action: Option<&Action>,
        step: Step,
    ) -> Result<bool> {
        let user = event.sender.id;
        match (step, &event.kind) {
            (Step::ChoosingRemovalCategory, EventKind::ButtonPress(_)) => {
                let Some(Action::Category(category)) = action else {
                    return Ok(false);
                };
                let products = self.catalog.find_by_category(*category).await?;
                if products.is_empty() {
                    self.registry.end(user);
                    let text = format!("No products in {}.", category.label());
                    self.channel.send_text(user, &text, None).await?;
                    return Ok(true);
                }

                self.registry
                    .advance(user, Step::ChoosingRemovalTarget, FieldBag::new())?;

                let (text, kb) = ui::removal_listing(&products);
                self.channel.send_text(user, &text, Some(&kb)).await?;
                Ok(true)
            }
            (Step::ChoosingRemovalTarget, EventKind::ButtonPress(_)) => {
                let Some(Action::RemoveProduct(id)) = action else {
                    return Ok(false);
                };
                let removed = self.catalog.find_by_id(*id).await?;
                self.catalog.delete(*id).await?;
                self.registry.end(user);
                metrics::counter!("engine_products_removed_total").increment(1);
                tracing::info!(product = %id, "product removed");

                let text = match removed {
                    Some(product) => format!("Removed {}.", product.name),
                    None => "Removed.".to_string(),
                };
                self.channel
                    .edit_text(user, event.message_id, &text, None)
                    .await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
