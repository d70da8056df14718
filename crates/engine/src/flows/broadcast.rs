//! Operator flows: broadcast to every user, or message one user by id.
//!
//! The broadcast copies the operator's own message, so whatever they
//! can compose (text, photo, anything the channel can carry) goes out
//! verbatim. Delivery failures are counted per recipient and never
//! abort the run. The conversation slot is ended before the send loop
//! starts; a long broadcast must not hold the operator's session
//! hostage.

use common::{MessageId, UserId};
use domain::parse_user_id;
use serde_json::json;
use store::{CartStore, CatalogStore, IdentityStore};

use crate::action::Action;
use crate::channel::MessageChannel;
use crate::error::Result;
use crate::event::{EventKind, InboundEvent};
use crate::registry::{ConversationState, FieldBag, FlowId, Step};
use crate::router::Router;
use crate::ui;

const ALL_PROMPT: &str = "Send the message to broadcast. It will be copied to every user.";
const TARGET_PROMPT: &str = "Send the numeric id of the user to message.";
const BAD_TARGET: &str = "That doesn't look like a user id. Send a number.";
const CONTENT_PROMPT: &str = "Now send the message for that user.";
const DELIVERED: &str = "Delivered.";

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub(crate) async fn begin_broadcast_all(&self, user: UserId) -> Result<()> {
        self.registry.begin(
            user,
            FlowId::BroadcastAll,
            Step::AwaitingContent,
            FieldBag::new(),
        );
        self.channel.send_text(user, ALL_PROMPT, None).await?;
        Ok(())
    }

    pub(crate) async fn begin_broadcast_by_id(&self, user: UserId) -> Result<()> {
        self.registry.begin(
            user,
            FlowId::BroadcastById,
            Step::AwaitingTarget,
            FieldBag::new(),
        );
        self.channel.send_text(user, TARGET_PROMPT, None).await?;
        Ok(())
    }

    pub(crate) async fn broadcast_step(
        &self,
        event: &InboundEvent,
        action: Option<&Action>,
        state: &ConversationState,
        step: Step,
    ) -> Result<bool> {
        let user = event.sender.id;
        let is_content = matches!(event.kind, EventKind::Text(_) | EventKind::Media(_));

        match (state.flow, step) {
            (FlowId::BroadcastById, Step::AwaitingTarget) => {
                let EventKind::Text(text) = &event.kind else {
                    return Ok(false);
                };
                match parse_user_id(text) {
                    Err(_) => {
                        self.channel.send_text(user, BAD_TARGET, None).await?;
                    }
                    Ok(target) => {
                        let mut patch = FieldBag::new();
                        patch.insert("target", json!(target.as_i64()));
                        self.registry.advance(user, Step::AwaitingContent, patch)?;
                        self.channel.send_text(user, CONTENT_PROMPT, None).await?;
                    }
                }
                Ok(true)
            }
            (flow, Step::AwaitingContent) if is_content => {
                let mut patch = FieldBag::new();
                patch.insert("source", json!(event.message_id.as_i64()));
                self.registry
                    .advance(user, Step::AwaitingBroadcastConfirm, patch)?;

                // preview exactly what the recipients will get
                self.channel.copy_message(user, event.message_id, user).await?;
                let text = match flow {
                    FlowId::BroadcastById => {
                        let target = state.fields.get_i64("target").unwrap_or_default();
                        format!("Send this to user {target}?")
                    }
                    _ => {
                        let total = self.identity.count().await?;
                        format!("Send this to {total} users?")
                    }
                };
                self.channel
                    .send_text(user, &text, Some(&ui::broadcast_confirm_controls()))
                    .await?;
                Ok(true)
            }
            (flow, Step::AwaitingBroadcastConfirm) => {
                let Some(Action::ConfirmBroadcast) = action else {
                    return Ok(false);
                };
                let source = state.fields.get_i64("source").map(MessageId::new);
                let target = state.fields.get_i64("target").map(UserId::new);
                self.registry.end(user);
                let Some(source) = source else {
                    return self.fallback(user).await.map(|()| true);
                };
                match flow {
                    FlowId::BroadcastById => {
                        let Some(target) = target else {
                            return self.fallback(user).await.map(|()| true);
                        };
                        self.send_direct(user, source, target).await?;
                    }
                    _ => self.run_broadcast(user, source).await?,
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn send_direct(&self, operator: UserId, source: MessageId, target: UserId) -> Result<()> {
        match self.channel.copy_message(operator, source, target).await {
            Ok(_) => {
                self.channel.send_text(operator, DELIVERED, None).await?;
            }
            Err(err) => {
                tracing::warn!(%target, error = %err, "direct message not delivered");
                let text = format!("Could not deliver to {target}.");
                self.channel.send_text(operator, &text, None).await?;
            }
        }
        Ok(())
    }

    async fn run_broadcast(&self, operator: UserId, source: MessageId) -> Result<()> {
        let recipients = self.identity.list_ids().await?;
        let total = recipients.len();
        let status = self
            .channel
            .send_text(operator, &ui::broadcast_progress(0, 0, total), None)
            .await?;

        let mut sent = 0usize;
        let mut failed = 0usize;
        for (i, recipient) in recipients.iter().enumerate() {
            match self.channel.copy_message(operator, source, *recipient).await {
                Ok(_) => sent += 1,
                Err(err) => {
                    failed += 1;
                    tracing::warn!(recipient = %recipient, error = %err, "broadcast delivery failed");
                }
            }
            let every = self.config.broadcast_progress_every;
            if every > 0 && (i + 1) % every == 0 {
                // progress edits are best effort
                let _ = self
                    .channel
                    .edit_text(
                        operator,
                        status,
                        &ui::broadcast_progress(sent, failed, total),
                        None,
                    )
                    .await;
            }
            tokio::time::sleep(self.config.broadcast_delay).await;
        }

        metrics::counter!("engine_broadcast_sent_total").increment(sent as u64);
        metrics::counter!("engine_broadcast_failed_total").increment(failed as u64);
        tracing::info!(sent, failed, total, "broadcast finished");

        self.channel
            .edit_text(operator, status, &ui::broadcast_done(sent, failed, total), None)
            .await?;
        Ok(())
    }
}
