use serde::{Deserialize, Serialize};

/// Unique identifier for a user (chat) on the messaging channel.
///
/// Wraps the channel-assigned numeric id to provide type safety and
/// prevent mixing up user ids with other numeric identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user ID from a raw channel id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Identifier of a message previously sent on the channel.
///
/// Message ids are only meaningful within the chat that produced them,
/// matching the channel's addressing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Creates a message ID from a raw channel id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<MessageId> for i64 {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_conversion_preserves_value() {
        let id = UserId::new(996_700_123);
        assert_eq!(id.as_i64(), 996_700_123);
        assert_eq!(i64::from(id), 996_700_123);
    }

    #[test]
    fn user_id_serialization_roundtrip() {
        let id = UserId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let deserialized: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn message_id_display() {
        assert_eq!(MessageId::new(17).to_string(), "17");
    }
}
