//! Inbound event model.
//!
//! Every interaction with the bot arrives as one [`InboundEvent`]; the
//! router is the single entry point that consumes them.

use common::{MessageId, UserId};
use domain::MediaRef;

/// The user who produced an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub name: String,
    pub handle: Option<String>,
    /// Set by the transport from the operator allow-list. Admin-only
    /// surface is excluded from matching when this is false.
    pub is_operator: bool,
}

impl Sender {
    /// Creates a regular (non-privileged) sender.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            handle: None,
            is_operator: false,
        }
    }

    /// Sets the sender's public handle.
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Marks the sender as a privileged operator.
    pub fn as_operator(mut self) -> Self {
        self.is_operator = true;
        self
    }
}

/// What kind of input the event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A slash command, e.g. `/start`.
    Command(String),
    /// A button press carrying an encoded action payload. The event's
    /// message id is the message bearing the keyboard.
    ButtonPress(String),
    /// Free text.
    Text(String),
    /// A media attachment, referenced by channel file id.
    Media(MediaRef),
}

/// A single inbound event consumed by the dispatch router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: Sender,
    pub message_id: MessageId,
    pub kind: EventKind,
}

impl InboundEvent {
    /// Creates a command event.
    pub fn command(sender: Sender, message_id: MessageId, name: impl Into<String>) -> Self {
        Self {
            sender,
            message_id,
            kind: EventKind::Command(name.into()),
        }
    }

    /// Creates a button-press event.
    pub fn button(sender: Sender, message_id: MessageId, payload: impl Into<String>) -> Self {
        Self {
            sender,
            message_id,
            kind: EventKind::ButtonPress(payload.into()),
        }
    }

    /// Creates a free-text event.
    pub fn text(sender: Sender, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            sender,
            message_id,
            kind: EventKind::Text(text.into()),
        }
    }

    /// Creates a media event.
    pub fn media(sender: Sender, message_id: MessageId, media: MediaRef) -> Self {
        Self {
            sender,
            message_id,
            kind: EventKind::Media(media),
        }
    }
}
