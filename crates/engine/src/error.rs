//! Engine error types.

use thiserror::Error;

use crate::channel::ChannelError;
use crate::registry::RegistryError;

/// Errors that can occur while dispatching an inbound event.
///
/// None of these are fatal to the process: the driver loop logs the
/// error and moves on to the next event.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Conversation state registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    /// Messaging channel error.
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Serialization error in the conversation field bag.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;
