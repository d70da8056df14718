//! Console transport adapter.
//!
//! Reads one inbound event per stdin line and logs every outbound
//! message through tracing. Line grammar:
//!
//! ```text
//! <user-id> /start            command
//! <user-id> btn:<payload>     button press
//! <user-id> media:<file-id>   media attachment
//! <user-id> anything else     free text
//! ```
//!
//! Prefix the user id with `@` to mark the sender as an operator
//! (normally derived from the `OPERATORS` allow-list).

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use common::{MessageId, UserId};
use domain::MediaRef;
use engine::{ChannelError, InboundEvent, Keyboard, MessageChannel, Sender};

/// Channel implementation that logs outbound traffic instead of
/// delivering it. Stands in for a real messenger transport.
#[derive(Debug, Default)]
pub struct TracingChannel {
    next_message_id: AtomicI64,
}

impl TracingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> MessageId {
        MessageId::new(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn describe_keyboard(keyboard: Option<&Keyboard>) -> String {
    let Some(keyboard) = keyboard else {
        return String::new();
    };
    keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| format!("[{} -> {}]", b.label, b.action.encode()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[async_trait]
impl MessageChannel for TracingChannel {
    async fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, ChannelError> {
        let id = self.next_id();
        tracing::info!(%to, message = %id, keyboard = %describe_keyboard(keyboard), "send text: {text}");
        Ok(id)
    }

    async fn send_media(
        &self,
        to: UserId,
        media: &MediaRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, ChannelError> {
        let id = self.next_id();
        tracing::info!(
            %to,
            message = %id,
            media = media.as_str(),
            keyboard = %describe_keyboard(keyboard),
            "send media: {caption}"
        );
        Ok(id)
    }

    async fn edit_text(
        &self,
        chat: UserId,
        message: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        tracing::info!(%chat, %message, keyboard = %describe_keyboard(keyboard), "edit text: {text}");
        Ok(())
    }

    async fn edit_caption(
        &self,
        chat: UserId,
        message: MessageId,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        tracing::info!(%chat, %message, keyboard = %describe_keyboard(keyboard), "edit caption: {caption}");
        Ok(())
    }

    async fn edit_controls(
        &self,
        chat: UserId,
        message: MessageId,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        tracing::info!(%chat, %message, keyboard = %describe_keyboard(keyboard), "edit controls");
        Ok(())
    }

    async fn edit_media(
        &self,
        chat: UserId,
        message: MessageId,
        media: &MediaRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        tracing::info!(
            %chat,
            %message,
            media = media.as_str(),
            keyboard = %describe_keyboard(keyboard),
            "edit media: {caption}"
        );
        Ok(())
    }

    async fn delete_message(&self, chat: UserId, message: MessageId) -> Result<(), ChannelError> {
        tracing::info!(%chat, %message, "delete message");
        Ok(())
    }

    async fn copy_message(
        &self,
        from: UserId,
        message: MessageId,
        to: UserId,
    ) -> Result<MessageId, ChannelError> {
        let id = self.next_id();
        tracing::info!(%from, %message, %to, new_message = %id, "copy message");
        Ok(id)
    }

    async fn toast(&self, to: UserId, text: &str) -> Result<(), ChannelError> {
        tracing::info!(%to, "toast: {text}");
        Ok(())
    }
}

/// Parses one console line into an inbound event. Returns None for
/// blank or malformed lines.
pub fn parse_line(line: &str, message_id: MessageId, operators: &[UserId]) -> Option<InboundEvent> {
    let line = line.trim();
    let (id_part, rest) = line.split_once(' ')?;

    let (id_part, forced_operator) = match id_part.strip_prefix('@') {
        Some(stripped) => (stripped, true),
        None => (id_part, false),
    };
    let id = UserId::new(id_part.parse().ok()?);

    let mut sender = Sender::new(id, format!("user-{id}"));
    if forced_operator || operators.contains(&id) {
        sender = sender.as_operator();
    }

    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    let event = if let Some(command) = rest.strip_prefix('/') {
        InboundEvent::command(sender, message_id, command)
    } else if let Some(payload) = rest.strip_prefix("btn:") {
        InboundEvent::button(sender, message_id, payload)
    } else if let Some(file_id) = rest.strip_prefix("media:") {
        InboundEvent::media(sender, message_id, MediaRef::new(file_id))
    } else {
        InboundEvent::text(sender, message_id, rest)
    };
    Some(event)
}
