//! Flow engines.
//!
//! Each submodule owns one conversational flow and hangs its handlers
//! off the router as methods. This module wires the router's dispatch
//! precedence to those handlers: first the active flow's step handlers,
//! then the stepless command/button surface.

pub mod admin_add;
pub mod admin_remove;
pub mod broadcast;
pub mod browse;
pub mod cart;
pub mod checkout;
pub mod search;
pub mod start;
pub mod stats;

use store::{CartStore, CatalogStore, IdentityStore};

use crate::action::Action;
use crate::channel::MessageChannel;
use crate::error::Result;
use crate::event::{EventKind, InboundEvent};
use crate::registry::{ConversationState, FlowId, Step};
use crate::router::Router;
use crate::ui;

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    /// Handles the universal cancel: ends any active flow and confirms.
    pub(crate) async fn handle_cancel(&self, event: &InboundEvent) -> Result<()> {
        let user = event.sender.id;
        if let Some(state) = self.registry.read(user) {
            tracing::debug!(%user, flow = %state.flow, step = %state.step, "flow cancelled");
        }
        self.registry.end(user);
        if matches!(event.kind, EventKind::ButtonPress(_)) {
            self.channel.delete_message(user, event.message_id).await?;
        }
        self.channel.send_text(user, ui::CANCELLED, None).await?;
        Ok(())
    }

    /// Offers the event to the active flow's step handlers. Returns
    /// true if the event was consumed.
    pub(crate) async fn dispatch_active(
        &self,
        event: &InboundEvent,
        action: Option<&Action>,
        state: &ConversationState,
    ) -> Result<bool> {
        let user = event.sender.id;
        match (state.flow, state.step, &event.kind) {
            (FlowId::Search, Step::AwaitingQuery, EventKind::Text(query)) => {
                self.run_search(user, query).await?;
                Ok(true)
            }
            (FlowId::Search, Step::AwaitingQuery, EventKind::Media(_)) => {
                self.channel.send_text(user, ui::SEARCH_PROMPT, None).await?;
                Ok(true)
            }
            (FlowId::Quantity, Step::AwaitingQuantity, EventKind::Text(text)) => {
                self.capture_quantity(user, state, text).await?;
                Ok(true)
            }
            (FlowId::Checkout, Step::AwaitingName, EventKind::Text(text)) => {
                self.capture_order_name(user, text).await?;
                Ok(true)
            }
            (FlowId::Checkout, Step::AwaitingPhone, EventKind::Text(text)) => {
                self.capture_order_phone(&event.sender, state, text).await?;
                Ok(true)
            }
            (FlowId::AddProduct, step, _) => self.add_product_step(event, action, state, step).await,
            (FlowId::RemoveProduct, step, _) => self.remove_product_step(event, action, step).await,
            (FlowId::BroadcastAll, step, _) | (FlowId::BroadcastById, step, _) => {
                self.broadcast_step(event, action, state, step).await
            }
            _ => Ok(false),
        }
    }

    /// Offers the event to the stepless surface. Returns true if it
    /// was consumed.
    pub(crate) async fn dispatch_stepless(
        &self,
        event: &InboundEvent,
        action: Option<&Action>,
    ) -> Result<bool> {
        let user = event.sender.id;

        if let EventKind::Command(name) = &event.kind {
            return match name.as_str() {
                "start" => {
                    self.open_start(&event.sender).await?;
                    Ok(true)
                }
                "admin" if event.sender.is_operator => {
                    self.open_admin_menu(user).await?;
                    Ok(true)
                }
                _ => Ok(false),
            };
        }

        let Some(action) = action else {
            return Ok(false);
        };

        match action {
            Action::Menu => self.open_menu(&event.sender).await?,
            Action::About => self.show_about(user).await?,
            Action::Products => self.open_categories(user).await?,
            Action::Search => self.begin_search(user).await?,
            Action::Category(category) => self.open_category(user, *category).await?,
            Action::Page { category, index } => {
                self.turn_page(user, event.message_id, *category, *index)
                    .await?
            }
            Action::SearchNav { query, index } => {
                self.turn_search_page(user, event.message_id, query, *index)
                    .await?
            }
            Action::AddToCart(id) => self.begin_quantity(user, *id).await?,
            Action::ViewCart => self.show_cart(user).await?,
            Action::ClearCart => self.clear_cart(user).await?,
            Action::Checkout => self.begin_checkout(user, event.message_id).await?,
            Action::AdminAddProduct => self.begin_add_product(user).await?,
            Action::AdminRemoveProduct => self.begin_remove_product(user).await?,
            Action::AdminUsers => self.show_users_page(user, 0, None).await?,
            Action::UsersPage(page) => {
                self.show_users_page(user, *page, Some(event.message_id))
                    .await?
            }
            Action::UsersSummary => self.show_users_summary(user).await?,
            Action::AdminBroadcastAll => self.begin_broadcast_all(user).await?,
            Action::AdminBroadcastById => self.begin_broadcast_by_id(user).await?,
            // flow-scoped buttons are only meaningful inside their flow;
            // outside it (stale keyboard) they fall through to fallback
            Action::Cancel
            | Action::RemoveProduct(_)
            | Action::ConfirmProduct
            | Action::DiscardProduct
            | Action::ConfirmBroadcast => return Ok(false),
        }
        Ok(true)
    }
}
