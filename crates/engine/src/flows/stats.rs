//! Operator stats: paged user listing and registration counters.

use chrono::Utc;
use common::{MessageId, UserId};
use store::{CartStore, CatalogStore, IdentityStore};

use crate::channel::MessageChannel;
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
    /// Shows one page of the registered-user listing. Paging edits the
    /// existing message; the first page sends a new one.
    pub(crate) async fn show_users_page(
        &self,
        user: UserId,
        page: usize,
        edit: Option<MessageId>,
    ) -> Result<()> {
        let size = self.config.users_page_size;
        let offset = page as u64 * size;
        let users = self.identity.list_page(offset, size).await?;

        if users.is_empty() {
            if page > 0 {
                self.channel.toast(user, ui::PAGE_OUT_OF_RANGE).await?;
            } else {
                self.channel.send_text(user, ui::NO_USERS, None).await?;
            }
            return Ok(());
        }

        let total = self.identity.count().await?;
        let has_next = offset + (users.len() as u64) < total;
        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        let text = ui::users_page_text(&ids, page);
        let kb = ui::users_page_controls(page, has_next);

        match edit {
            Some(message) => {
                self.channel
                    .edit_text(user, message, &text, Some(&kb))
                    .await?
            }
            None => {
                self.channel.send_text(user, &text, Some(&kb)).await?;
            }
        }
        Ok(())
    }

    pub(crate) async fn show_users_summary(&self, user: UserId) -> Result<()> {
        let total = self.identity.count().await?;
        let last_day = self
            .identity
            .count_since(Utc::now() - chrono::Duration::hours(24))
            .await?;
        self.channel
            .send_text(user, &ui::users_summary_text(total, last_day), None)
            .await?;
        Ok(())
    }
}
