//! Catalog browsing: category picker and in-place pagination.
//!
//! The page cursor lives in the button payload, not the registry, so a
//! browse keyboard keeps working after the conversation slot is gone.
//! Listings are re-fetched on every press; an index that fell out of
//! range (concurrent deletion, or stepping past either end) produces a
//! toast and leaves the card unchanged.

use common::{MessageId, UserId};
use domain::{Category, Product};
use store::{CartStore, CatalogStore, IdentityStore};

use crate::channel::{Keyboard, MessageChannel};
use crate::error::Result;
use crate::router::Router;
use crate::ui;

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub(crate) async fn open_categories(&self, user: UserId) -> Result<()> {
        self.channel
            .send_text(user, "Choose a category:", Some(&ui::category_picker()))
            .await?;
        Ok(())
    }

    pub(crate) async fn open_category(&self, user: UserId, category: Category) -> Result<()> {
        let products = self.catalog.find_by_category(category).await?;
        if products.is_empty() {
            let text = format!("Nothing in {} yet.", category.label());
            self.channel
                .send_text(user, &text, Some(&back_to_categories()))
                .await?;
            return Ok(());
        }
        let product = &products[0];
        let kb = ui::browse_controls(category, 0, products.len(), product.id);
        self.send_card(user, product, 0, products.len(), &kb).await
    }

    pub(crate) async fn turn_page(
        &self,
        user: UserId,
        message: MessageId,
        category: Category,
        index: usize,
    ) -> Result<()> {
        let products = self.catalog.find_by_category(category).await?;
        if index >= products.len() {
            self.channel.toast(user, ui::PAGE_OUT_OF_RANGE).await?;
            return Ok(());
        }
        let product = &products[index];
        let kb = ui::browse_controls(category, index, products.len(), product.id);
        self.channel
            .edit_media(
                user,
                message,
                &product.media,
                &ui::product_caption(product, index, products.len()),
                Some(&kb),
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn send_card(
        &self,
        user: UserId,
        product: &Product,
        index: usize,
        total: usize,
        keyboard: &Keyboard,
    ) -> Result<()> {
        self.channel
            .send_media(
                user,
                &product.media,
                &ui::product_caption(product, index, total),
                Some(keyboard),
            )
            .await?;
        Ok(())
    }
}

fn back_to_categories() -> Keyboard {
    Keyboard::new().button("⬅️ Categories", crate::Action::Products)
}
