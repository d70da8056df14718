//! Per-user conversation state registry.
//!
//! At most one conversation slot exists per user. Beginning a flow
//! overwrites whatever was there before, so a user is never wedged in a
//! half-finished flow: the newest intent wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::UserId;
use serde_json::Value;
use thiserror::Error;

/// Errors from conversation-slot operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An advance or read targeted a user with no active flow.
    #[error("no active flow for user {user_id}")]
    NoActiveFlow { user_id: UserId },

    /// The registry lock was poisoned by a panicking writer.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

/// Identifies which multi-step flow a conversation slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowId {
    Search,
    Quantity,
    Checkout,
    AddProduct,
    RemoveProduct,
    BroadcastAll,
    BroadcastById,
}

impl FlowId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowId::Search => "search",
            FlowId::Quantity => "quantity",
            FlowId::Checkout => "checkout",
            FlowId::AddProduct => "add_product",
            FlowId::RemoveProduct => "remove_product",
            FlowId::BroadcastAll => "broadcast_all",
            FlowId::BroadcastById => "broadcast_by_id",
        }
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The step a conversation slot is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    // search
    AwaitingQuery,
    // quantity
    AwaitingQuantity,
    // checkout
    AwaitingName,
    AwaitingPhone,
    // add product
    AwaitingProductName,
    AwaitingProductDescription,
    AwaitingProductPrice,
    AwaitingProductCategory,
    AwaitingProductImage,
    AwaitingProductConfirm,
    // remove product
    ChoosingRemovalCategory,
    ChoosingRemovalTarget,
    // broadcast
    AwaitingTarget,
    AwaitingContent,
    AwaitingBroadcastConfirm,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::AwaitingQuery => "awaiting_query",
            Step::AwaitingQuantity => "awaiting_quantity",
            Step::AwaitingName => "awaiting_name",
            Step::AwaitingPhone => "awaiting_phone",
            Step::AwaitingProductName => "awaiting_product_name",
            Step::AwaitingProductDescription => "awaiting_product_description",
            Step::AwaitingProductPrice => "awaiting_product_price",
            Step::AwaitingProductCategory => "awaiting_product_category",
            Step::AwaitingProductImage => "awaiting_product_image",
            Step::AwaitingProductConfirm => "awaiting_product_confirm",
            Step::ChoosingRemovalCategory => "choosing_removal_category",
            Step::ChoosingRemovalTarget => "choosing_removal_target",
            Step::AwaitingTarget => "awaiting_target",
            Step::AwaitingContent => "awaiting_content",
            Step::AwaitingBroadcastConfirm => "awaiting_broadcast_confirm",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed view over the JSON fields a flow accumulates across steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag(HashMap<String, Value>);

impl FieldBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Merges another bag into this one, overwriting colliding keys.
    pub fn merge(&mut self, patch: FieldBag) {
        self.0.extend(patch.0);
    }
}

impl FromIterator<(String, Value)> for FieldBag {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One user's active conversation slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    pub flow: FlowId,
    pub step: Step,
    pub fields: FieldBag,
    pub touched_at: DateTime<Utc>,
}

/// Registry of per-user conversation slots.
///
/// All methods are synchronous; the lock is held only for the duration
/// of the map operation, never across an await point.
#[derive(Debug, Clone, Default)]
pub struct ConversationRegistry {
    slots: Arc<RwLock<HashMap<UserId, ConversationState>>>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a flow for a user, overwriting any existing slot.
    pub fn begin(&self, user_id: UserId, flow: FlowId, step: Step, fields: FieldBag) {
        let state = ConversationState {
            flow,
            step,
            fields,
            touched_at: Utc::now(),
        };
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.insert(user_id, state);
    }

    /// Advances an active flow to the next step, merging `patch` into
    /// the accumulated fields.
    pub fn advance(
        &self,
        user_id: UserId,
        step: Step,
        patch: FieldBag,
    ) -> Result<(), RegistryError> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let state = slots
            .get_mut(&user_id)
            .ok_or(RegistryError::NoActiveFlow { user_id })?;
        state.step = step;
        state.fields.merge(patch);
        state.touched_at = Utc::now();
        Ok(())
    }

    /// Returns a snapshot of the user's slot, if any.
    pub fn read(&self, user_id: UserId) -> Option<ConversationState> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.get(&user_id).cloned()
    }

    /// Ends the user's flow. Ending an absent slot is a no-op.
    pub fn end(&self, user_id: UserId) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(&user_id);
    }

    /// Removes slots not touched within `max_idle` and returns how many
    /// were dropped.
    pub fn reap_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = Utc::now() - max_idle;
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        slots.retain(|_, state| state.touched_at > cutoff);
        before - slots.len()
    }

    /// Number of active conversation slots.
    pub fn active_count(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: i64) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn begin_overwrites_existing_slot() {
        let registry = ConversationRegistry::new();
        registry.begin(user(1), FlowId::Search, Step::AwaitingQuery, FieldBag::new());
        registry.begin(user(1), FlowId::Checkout, Step::AwaitingName, FieldBag::new());

        let state = registry.read(user(1)).unwrap();
        assert_eq!(state.flow, FlowId::Checkout);
        assert_eq!(state.step, Step::AwaitingName);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn advance_merges_fields_and_moves_step() {
        let registry = ConversationRegistry::new();
        let mut fields = FieldBag::new();
        fields.insert("name", json!("Alice"));
        registry.begin(user(1), FlowId::Checkout, Step::AwaitingName, fields);

        let mut patch = FieldBag::new();
        patch.insert("phone", json!("+996700123456"));
        registry
            .advance(user(1), Step::AwaitingPhone, patch)
            .unwrap();

        let state = registry.read(user(1)).unwrap();
        assert_eq!(state.step, Step::AwaitingPhone);
        assert_eq!(state.fields.get_str("name"), Some("Alice"));
        assert_eq!(state.fields.get_str("phone"), Some("+996700123456"));
    }

    #[test]
    fn advance_without_active_flow_is_an_error() {
        let registry = ConversationRegistry::new();
        let result = registry.advance(user(9), Step::AwaitingPhone, FieldBag::new());
        assert!(matches!(
            result,
            Err(RegistryError::NoActiveFlow { user_id }) if user_id == user(9)
        ));
    }

    #[test]
    fn end_is_idempotent() {
        let registry = ConversationRegistry::new();
        registry.begin(user(1), FlowId::Search, Step::AwaitingQuery, FieldBag::new());
        registry.end(user(1));
        registry.end(user(1));
        assert!(registry.read(user(1)).is_none());
    }

    #[test]
    fn reap_idle_drops_only_stale_slots() {
        let registry = ConversationRegistry::new();
        registry.begin(user(1), FlowId::Search, Step::AwaitingQuery, FieldBag::new());
        registry.begin(user(2), FlowId::Search, Step::AwaitingQuery, FieldBag::new());

        // backdate one slot
        {
            let mut slots = registry.slots.write().unwrap();
            slots.get_mut(&user(1)).unwrap().touched_at =
                Utc::now() - chrono::Duration::hours(2);
        }

        let reaped = registry.reap_idle(Duration::from_secs(3600));
        assert_eq!(reaped, 1);
        assert!(registry.read(user(1)).is_none());
        assert!(registry.read(user(2)).is_some());
    }
}
