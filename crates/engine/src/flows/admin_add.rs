//! Operator flow: add a product to the catalog.
//!
//! Collects name, description, price, category, and photo one step at a
//! time, then shows a draft card that must be explicitly committed.
//! Nothing touches the catalog until the commit button.

use common::UserId;
use domain::{Category, Money, NewProduct};
use serde_json::json;
use store::{CartStore, CatalogStore, IdentityStore};

use crate::action::Action;
use crate::channel::MessageChannel;
use crate::error::Result;
use crate::event::{EventKind, InboundEvent};
use crate::registry::{ConversationState, FieldBag, Step};
use crate::router::Router;
use crate::ui;

const NAME_PROMPT: &str = "Send the product name.";
const DESCRIPTION_PROMPT: &str = "Send the description.";
const PRICE_PROMPT: &str = "Send the price, e.g. 4500 or 10.50.";
const BAD_PRICE: &str = "That price doesn't parse. Send e.g. 4500 or 10.50.";
const CATEGORY_PROMPT: &str = "Pick a category:";
const IMAGE_PROMPT: &str = "Send a product photo.";
const DISCARDED: &str = "Draft discarded.";

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub(crate) async fn begin_add_product(&self, user: UserId) -> Result<()> {
        self.registry.begin(
            user,
            crate::registry::FlowId::AddProduct,
            Step::AwaitingProductName,
            FieldBag::new(),
        );
        self.channel.send_text(user, NAME_PROMPT, None).await?;
        Ok(())
    }

    pub(crate) async fn add_product_step(
        &self,
        event: &InboundEvent,
        action: Option<&Action>,
        state: &ConversationState,
        step: Step,
    ) -> Result<bool> {
        let user = event.sender.id;
        match (step, &event.kind) {
            (Step::AwaitingProductName, EventKind::Text(text)) => {
                let mut patch = FieldBag::new();
                patch.insert("name", json!(text.trim()));
                self.registry
                    .advance(user, Step::AwaitingProductDescription, patch)?;
                self.channel.send_text(user, DESCRIPTION_PROMPT, None).await?;
                Ok(true)
            }
            (Step::AwaitingProductDescription, EventKind::Text(text)) => {
                let mut patch = FieldBag::new();
                patch.insert("description", json!(text.trim()));
                self.registry
                    .advance(user, Step::AwaitingProductPrice, patch)?;
                self.channel.send_text(user, PRICE_PROMPT, None).await?;
                Ok(true)
            }
            (Step::AwaitingProductPrice, EventKind::Text(text)) => {
                let Ok(price) = text.trim().parse::<Money>() else {
                    self.channel.send_text(user, BAD_PRICE, None).await?;
                    return Ok(true);
                };
                let mut patch = FieldBag::new();
                patch.insert("price_minor", json!(price.minor()));
                self.registry
                    .advance(user, Step::AwaitingProductCategory, patch)?;
                self.channel
                    .send_text(user, CATEGORY_PROMPT, Some(&ui::category_picker()))
                    .await?;
                Ok(true)
            }
            (Step::AwaitingProductCategory, EventKind::ButtonPress(_)) => {
                let Some(Action::Category(category)) = action else {
                    return Ok(false);
                };
                let mut patch = FieldBag::new();
                patch.insert("category", json!(category.as_str()));
                self.registry
                    .advance(user, Step::AwaitingProductImage, patch)?;
                self.channel.send_text(user, IMAGE_PROMPT, None).await?;
                Ok(true)
            }
            (Step::AwaitingProductImage, EventKind::Text(_)) => {
                self.channel.send_text(user, IMAGE_PROMPT, None).await?;
                Ok(true)
            }
            (Step::AwaitingProductImage, EventKind::Media(media)) => {
                let mut patch = FieldBag::new();
                patch.insert("media", json!(media.as_str()));
                self.registry
                    .advance(user, Step::AwaitingProductConfirm, patch.clone())?;

                let mut complete = state.clone();
                complete.fields.merge(patch);
                match draft_from_fields(&complete) {
                    Some(draft) => {
                        let summary = ui::product_draft_summary(
                            &draft.name,
                            &draft.description,
                            draft.price,
                            draft.category,
                        );
                        self.channel
                            .send_media(
                                user,
                                &draft.media,
                                &summary,
                                Some(&ui::product_confirm_controls()),
                            )
                            .await?;
                    }
                    None => {
                        self.registry.end(user);
                        self.fallback(user).await?;
                    }
                }
                Ok(true)
            }
            (Step::AwaitingProductConfirm, EventKind::ButtonPress(_)) => match action {
                Some(Action::ConfirmProduct) => {
                    let Some(draft) = draft_from_fields(state) else {
                        self.registry.end(user);
                        self.fallback(user).await?;
                        return Ok(true);
                    };
                    let product = self.catalog.create(draft).await?;
                    self.registry.end(user);
                    metrics::counter!("engine_products_added_total").increment(1);
                    tracing::info!(id = %product.id, name = %product.name, "product added");
                    // rewrite the draft card in place, retiring its keyboard
                    let text = format!("Product added: {} (id {}).", product.name, product.id);
                    self.channel
                        .edit_caption(user, event.message_id, &text, None)
                        .await?;
                    Ok(true)
                }
                Some(Action::DiscardProduct) => {
                    self.registry.end(user);
                    self.channel.delete_message(user, event.message_id).await?;
                    self.channel.send_text(user, DISCARDED, None).await?;
                    Ok(true)
                }
                _ => Ok(false),
            },
            _ => Ok(false),
        }
    }
}

fn draft_from_fields(state: &ConversationState) -> Option<NewProduct> {
    let name = state.fields.get_str("name")?;
    let description = state.fields.get_str("description")?;
    let price = Money::from_minor(state.fields.get_i64("price_minor")?);
    let category = Category::from_token(state.fields.get_str("category")?)?;
    let media = state.fields.get_str("media")?;
    Some(NewProduct::new(name, description, price, category, media))
}
