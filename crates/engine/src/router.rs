//! The dispatch router.
//!
//! Single entry point for every inbound event. Matching precedence is
//! fixed:
//!
//! 1. cancel (the `/stop` command or a cancel button) always wins
//! 2. step-filtered button handlers of the active flow
//! 3. step text/media handlers of the active flow
//! 4. stepless commands and buttons
//! 5. fallback
//!
//! Events from the same user are serialized through a [`SessionGate`];
//! events from different users dispatch concurrently.

use std::sync::Arc;
use std::time::Duration;

use common::UserId;
use store::{CartStore, CatalogStore, IdentityStore};

use crate::action::Action;
use crate::channel::MessageChannel;
use crate::error::Result;
use crate::event::{EventKind, InboundEvent};
use crate::registry::ConversationRegistry;
use crate::session::SessionGate;
use crate::ui;

/// What happens when a non-operator presses a privileged button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatePolicy {
    /// Treat the event as unmatched. The privileged surface stays
    /// invisible to regular users.
    #[default]
    Silent,
    /// Show a transient denial notice.
    Notify,
}

/// Router tuning knobs, loaded from the environment by the binary.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Privileged user ids. The transport marks senders against this
    /// list before building the event.
    pub operators: Vec<UserId>,
    pub gate_policy: GatePolicy,
    /// Pause between consecutive broadcast deliveries.
    pub broadcast_delay: Duration,
    /// Edit the broadcast progress message every this many deliveries.
    pub broadcast_progress_every: usize,
    /// Rows per page of the operator user listing.
    pub users_page_size: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            operators: Vec::new(),
            gate_policy: GatePolicy::Silent,
            broadcast_delay: Duration::from_millis(40),
            broadcast_progress_every: 10,
            users_page_size: 20,
        }
    }
}

/// Dispatches inbound events to the flow engines.
pub struct Router<Cat, Crt, Idn, Ch> {
    pub(crate) catalog: Arc<Cat>,
    pub(crate) cart: Arc<Crt>,
    pub(crate) identity: Arc<Idn>,
    pub(crate) channel: Arc<Ch>,
    pub(crate) registry: ConversationRegistry,
    pub(crate) config: RouterConfig,
    gate: SessionGate,
}

impl<Cat, Crt, Idn, Ch> Router<Cat, Crt, Idn, Ch>
where
    Cat: CatalogStore,
    Crt: CartStore,
    Idn: IdentityStore,
    Ch: MessageChannel,
{
    pub fn new(
        catalog: Arc<Cat>,
        cart: Arc<Crt>,
        identity: Arc<Idn>,
        channel: Arc<Ch>,
        config: RouterConfig,
    ) -> Self {
        Self {
            catalog,
            cart,
            identity,
            channel,
            registry: ConversationRegistry::new(),
            config,
            gate: SessionGate::new(),
        }
    }

    /// The conversation registry, exposed for the idle-reaper task.
    pub fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    /// Handles one inbound event end to end.
    #[tracing::instrument(skip(self, event), fields(user = %event.sender.id))]
    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        let _guard = self.gate.acquire(event.sender.id).await;
        metrics::counter!("engine_events_total").increment(1);
        self.dispatch(event).await
    }

    async fn dispatch(&self, event: InboundEvent) -> Result<()> {
        let user = event.sender.id;

        // cancel wins over everything, active flow or not
        if is_cancel(&event.kind) {
            return self.handle_cancel(&event).await;
        }

        // decode button payloads once; malformed means no-match
        let action = match &event.kind {
            EventKind::ButtonPress(payload) => match Action::decode(payload) {
                Ok(action) => Some(action),
                Err(err) => {
                    tracing::warn!(%user, error = %err, "malformed button payload");
                    return self.fallback(user).await;
                }
            },
            _ => None,
        };

        // privilege gate fails closed
        if let Some(action) = &action {
            if action.is_privileged() && !event.sender.is_operator {
                metrics::counter!("engine_gate_denials_total").increment(1);
                tracing::warn!(%user, action = %action.encode(), "privileged action denied");
                return match self.config.gate_policy {
                    GatePolicy::Silent => self.fallback(user).await,
                    GatePolicy::Notify => {
                        self.channel.toast(user, ui::NOT_ALLOWED).await?;
                        Ok(())
                    }
                };
            }
        }

        if let Some(state) = self.registry.read(user) {
            if self.dispatch_active(&event, action.as_ref(), &state).await? {
                return Ok(());
            }
        }

        if self.dispatch_stepless(&event, action.as_ref()).await? {
            return Ok(());
        }

        self.fallback(user).await
    }

    pub(crate) async fn fallback(&self, user: UserId) -> Result<()> {
        metrics::counter!("engine_fallbacks_total").increment(1);
        self.channel.send_text(user, ui::FALLBACK, None).await?;
        Ok(())
    }
}

fn is_cancel(kind: &EventKind) -> bool {
    match kind {
        EventKind::Command(name) => name == "stop",
        EventKind::ButtonPress(payload) => payload == "cancel",
        _ => false,
    }
}
