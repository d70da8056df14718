//! Name search: a one-step flow that prompts for a query, then hands
//! the result set over to payload-carried pagination.
//!
//! The query travels inside the nav buttons (escaped), and every page
//! turn re-runs the search against live catalog data. The slot is ended
//! as soon as results are shown.

use common::{MessageId, UserId};
use store::{CartStore, CatalogStore, CatalogStoreExt, IdentityStore};

use crate::channel::MessageChannel;
use crate::error::Result;
use crate::registry::{FieldBag, FlowId, Step};
use crate::router::Router;
use crate::ui;

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub(crate) async fn begin_search(&self, user: UserId) -> Result<()> {
        self.registry
            .begin(user, FlowId::Search, Step::AwaitingQuery, FieldBag::new());
        self.channel.send_text(user, ui::SEARCH_PROMPT, None).await?;
        Ok(())
    }

    pub(crate) async fn run_search(&self, user: UserId, query: &str) -> Result<()> {
        let query = query.trim();
        let results = self.catalog.search_by_name(query).await?;
        self.registry.end(user);
        metrics::counter!("engine_searches_total").increment(1);

        if results.is_empty() {
            self.channel
                .send_text(user, &nothing_found(query), None)
                .await?;
            return Ok(());
        }

        let product = &results[0];
        let kb = ui::search_controls(query, 0, results.len(), product.id);
        self.send_card(user, product, 0, results.len(), &kb).await
    }

    pub(crate) async fn turn_search_page(
        &self,
        user: UserId,
        message: MessageId,
        query: &str,
        index: usize,
    ) -> Result<()> {
        let results = self.catalog.search_by_name(query).await?;

        // the catalog may have changed since the results were shown
        if results.is_empty() {
            self.channel.delete_message(user, message).await?;
            self.channel
                .send_text(user, &nothing_found(query), None)
                .await?;
            return Ok(());
        }
        if index >= results.len() {
            self.channel.toast(user, ui::PAGE_OUT_OF_RANGE).await?;
            return Ok(());
        }

        let product = &results[index];
        let kb = ui::search_controls(query, index, results.len(), product.id);
        self.channel
            .edit_media(
                user,
                message,
                &product.media,
                &ui::product_caption(product, index, results.len()),
                Some(&kb),
            )
            .await?;
        Ok(())
    }
}

fn nothing_found(query: &str) -> String {
    format!("Nothing found for \"{query}\".")
}
