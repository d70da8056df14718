//! Per-user event serialization.
//!
//! Events from different users are handled concurrently, but two events
//! from the same user must never interleave inside the dispatch path:
//! a slot advance racing a slot read would make flow behavior depend on
//! scheduler timing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::UserId;
use tokio::sync::OwnedMutexGuard;

/// Hands out one async mutex per user id.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    locks: Arc<Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `user_id`, waiting behind any event from
    /// the same user that is already being dispatched.
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }
}
