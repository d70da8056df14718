//! Conversation engine for the commerce assistant.
//!
//! This crate provides the core of the system:
//! - An inbound event model shared by every flow
//! - A typed action-payload codec for button presses
//! - The per-user conversation state registry
//! - The dispatch router with its fixed matching precedence
//! - The flow engines (browse, search, cart, checkout, and the
//!   operator-only add/remove/broadcast flows)
//! - The messaging channel trait with an in-memory recording
//!   implementation for tests

pub mod action;
pub mod channel;
pub mod error;
pub mod event;
pub mod flows;
pub mod registry;
pub mod router;
pub mod session;
pub mod ui;

pub use action::{Action, ActionParseError};
pub use channel::{Button, ChannelError, InMemoryChannel, Keyboard, MessageChannel, OutboundEffect};
pub use error::{EngineError, Result};
pub use event::{EventKind, InboundEvent, Sender};
pub use registry::{ConversationRegistry, ConversationState, FieldBag, FlowId, RegistryError, Step};
pub use router::{GatePolicy, Router, RouterConfig};
pub use session::SessionGate;
