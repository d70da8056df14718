//! Entry points: `/start`, the main menu, about, and the admin menu.

use domain::User;
use store::{CartStore, CatalogStore, IdentityStore};

use crate::channel::{Keyboard, MessageChannel};
use crate::error::Result;
use crate::event::Sender;
use crate::router::Router;
use crate::ui;
use crate::Action;
use common::UserId;

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    /// `/start`: registers the user on first contact, resets any active
    /// flow, and shows the main menu.
    pub(crate) async fn open_start(&self, sender: &Sender) -> Result<()> {
        let record = User::new(sender.id, sender.name.clone(), sender.handle.clone());
        if self.identity.register(record).await? {
            metrics::counter!("engine_users_registered_total").increment(1);
            tracing::info!(user = %sender.id, "new user registered");
        }
        self.registry.end(sender.id);
        self.channel
            .send_text(sender.id, ui::WELCOME, Some(&ui::main_menu(sender.is_operator)))
            .await?;
        Ok(())
    }

    pub(crate) async fn open_menu(&self, sender: &Sender) -> Result<()> {
        self.channel
            .send_text(sender.id, ui::WELCOME, Some(&ui::main_menu(sender.is_operator)))
            .await?;
        Ok(())
    }

    pub(crate) async fn show_about(&self, user: UserId) -> Result<()> {
        let kb = Keyboard::new().button("⬅️ Menu", Action::Menu);
        self.channel.send_text(user, ui::ABOUT, Some(&kb)).await?;
        Ok(())
    }

    pub(crate) async fn open_admin_menu(&self, user: UserId) -> Result<()> {
        self.channel
            .send_text(user, "Admin panel", Some(&ui::admin_menu()))
            .await?;
        Ok(())
    }
}
