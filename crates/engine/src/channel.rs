//! Messaging channel abstraction.
//!
//! Flows never talk to a concrete transport. They emit messages through
//! [`MessageChannel`], and the transport adapter (or the in-memory
//! recorder in tests) decides what that means on the wire.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::{MessageId, UserId};
use domain::MediaRef;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::action::Action;

/// Errors from the messaging channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Delivery to one recipient failed. Broadcast treats this as a
    /// per-recipient failure, not an abort.
    #[error("delivery to {recipient} failed: {reason}")]
    SendFailed { recipient: UserId, reason: String },
}

/// A single inline button: a label and the action it fires.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// An inline keyboard attached to an outbound message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row of buttons.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Adds a single-button row.
    pub fn button(self, label: impl Into<String>, action: Action) -> Self {
        self.row(vec![Button::new(label, action)])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outbound messaging operations used by the flow engines.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Sends a text message, returning the id of the sent message.
    async fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, ChannelError>;

    /// Sends a media message with a caption.
    async fn send_media(
        &self,
        to: UserId,
        media: &MediaRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, ChannelError>;

    /// Replaces the text of an existing message in place.
    async fn edit_text(
        &self,
        chat: UserId,
        message: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Replaces the caption of an existing media message in place.
    async fn edit_caption(
        &self,
        chat: UserId,
        message: MessageId,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Replaces only the keyboard of an existing message.
    async fn edit_controls(
        &self,
        chat: UserId,
        message: MessageId,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Replaces the media, caption, and keyboard of an existing message
    /// in place. Used for pagination without message churn.
    async fn edit_media(
        &self,
        chat: UserId,
        message: MessageId,
        media: &MediaRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Deletes a message.
    async fn delete_message(&self, chat: UserId, message: MessageId) -> Result<(), ChannelError>;

    /// Re-delivers an existing message to another recipient, preserving
    /// its content without a forwarding header.
    async fn copy_message(
        &self,
        from: UserId,
        message: MessageId,
        to: UserId,
    ) -> Result<MessageId, ChannelError>;

    /// Shows a transient notice that does not add a message to the
    /// conversation (out-of-range pagination, gate denials).
    async fn toast(&self, to: UserId, text: &str) -> Result<(), ChannelError>;
}

/// One recorded outbound effect, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEffect {
    Text {
        to: UserId,
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Media {
        to: UserId,
        message_id: MessageId,
        media: MediaRef,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    EditText {
        chat: UserId,
        message: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    EditCaption {
        chat: UserId,
        message: MessageId,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    EditControls {
        chat: UserId,
        message: MessageId,
        keyboard: Option<Keyboard>,
    },
    EditMedia {
        chat: UserId,
        message: MessageId,
        media: MediaRef,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    Delete {
        chat: UserId,
        message: MessageId,
    },
    Copy {
        from: UserId,
        message: MessageId,
        to: UserId,
        new_message_id: MessageId,
    },
    Toast {
        to: UserId,
        text: String,
    },
}

#[derive(Debug, Default)]
struct RecorderState {
    effects: Vec<OutboundEffect>,
    next_message_id: i64,
    failing_recipients: HashSet<UserId>,
}

/// In-memory channel that records every effect, for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChannel {
    state: Arc<RwLock<RecorderState>>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery to `recipient` fail from now on.
    pub async fn set_fail_for(&self, recipient: UserId) {
        self.state.write().await.failing_recipients.insert(recipient);
    }

    /// Returns all recorded effects in emission order.
    pub async fn effects(&self) -> Vec<OutboundEffect> {
        self.state.read().await.effects.clone()
    }

    /// Returns only the text messages sent to `to`.
    pub async fn texts_to(&self, to: UserId) -> Vec<String> {
        self.state
            .read()
            .await
            .effects
            .iter()
            .filter_map(|e| match e {
                OutboundEffect::Text { to: t, text, .. } if *t == to => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns only the toasts shown to `to`.
    pub async fn toasts_to(&self, to: UserId) -> Vec<String> {
        self.state
            .read()
            .await
            .effects
            .iter()
            .filter_map(|e| match e {
                OutboundEffect::Toast { to: t, text } if *t == to => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(
        &self,
        recipient: UserId,
        effect: impl FnOnce(MessageId) -> OutboundEffect,
    ) -> Result<MessageId, ChannelError> {
        let mut state = self.state.write().await;
        if state.failing_recipients.contains(&recipient) {
            return Err(ChannelError::SendFailed {
                recipient,
                reason: "recipient unreachable".to_string(),
            });
        }
        state.next_message_id += 1;
        let id = MessageId::new(state.next_message_id);
        state.effects.push(effect(id));
        Ok(id)
    }

    async fn record_edit(
        &self,
        recipient: UserId,
        effect: OutboundEffect,
    ) -> Result<(), ChannelError> {
        let mut state = self.state.write().await;
        if state.failing_recipients.contains(&recipient) {
            return Err(ChannelError::SendFailed {
                recipient,
                reason: "recipient unreachable".to_string(),
            });
        }
        state.effects.push(effect);
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for InMemoryChannel {
    async fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, ChannelError> {
        let text = text.to_string();
        let keyboard = keyboard.cloned();
        self.record(to, |message_id| OutboundEffect::Text {
            to,
            message_id,
            text,
            keyboard,
        })
        .await
    }

    async fn send_media(
        &self,
        to: UserId,
        media: &MediaRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, ChannelError> {
        let media = media.clone();
        let caption = caption.to_string();
        let keyboard = keyboard.cloned();
        self.record(to, |message_id| OutboundEffect::Media {
            to,
            message_id,
            media,
            caption,
            keyboard,
        })
        .await
    }

    async fn edit_text(
        &self,
        chat: UserId,
        message: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        self.record_edit(
            chat,
            OutboundEffect::EditText {
                chat,
                message,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
        .await
    }

    async fn edit_caption(
        &self,
        chat: UserId,
        message: MessageId,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        self.record_edit(
            chat,
            OutboundEffect::EditCaption {
                chat,
                message,
                caption: caption.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
        .await
    }

    async fn edit_controls(
        &self,
        chat: UserId,
        message: MessageId,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        self.record_edit(
            chat,
            OutboundEffect::EditControls {
                chat,
                message,
                keyboard: keyboard.cloned(),
            },
        )
        .await
    }

    async fn edit_media(
        &self,
        chat: UserId,
        message: MessageId,
        media: &MediaRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        self.record_edit(
            chat,
            OutboundEffect::EditMedia {
                chat,
                message,
                media: media.clone(),
                caption: caption.to_string(),
                keyboard: keyboard.cloned(),
            },
        )
        .await
    }

    async fn delete_message(&self, chat: UserId, message: MessageId) -> Result<(), ChannelError> {
        self.record_edit(chat, OutboundEffect::Delete { chat, message })
            .await
    }

    async fn copy_message(
        &self,
        from: UserId,
        message: MessageId,
        to: UserId,
    ) -> Result<MessageId, ChannelError> {
        self.record(to, |new_message_id| OutboundEffect::Copy {
            from,
            message,
            to,
            new_message_id,
        })
        .await
    }

    async fn toast(&self, to: UserId, text: &str) -> Result<(), ChannelError> {
        // toasts go through even for failing recipients: the user is
        // interacting right now, only push delivery is unreliable
        let mut state = self.state.write().await;
        state.effects.push(OutboundEffect::Toast {
            to,
            text: text.to_string(),
        });
        Ok(())
    }
}
