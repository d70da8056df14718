use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::User;

use crate::Result;

/// User registration, enumeration, and statistics.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Registers a user if not already present (create-if-absent).
    /// Returns true when a new record was created.
    async fn register(&self, user: User) -> Result<bool>;

    /// Returns true if the user is registered.
    async fn exists(&self, id: UserId) -> Result<bool>;

    /// Total number of registered users.
    async fn count(&self) -> Result<u64>;

    /// Number of users registered at or after the given instant.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64>;

    /// Every registered user id, in registration order. Used as the
    /// broadcast recipient list.
    async fn list_ids(&self) -> Result<Vec<UserId>>;

    /// One page of users in registration order.
    async fn list_page(&self, offset: u64, size: u64) -> Result<Vec<User>>;
}
