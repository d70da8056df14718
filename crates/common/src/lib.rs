//! Shared types used across the conversational commerce engine.

pub mod types;

pub use types::{MessageId, UserId};
