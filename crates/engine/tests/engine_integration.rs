//! End-to-end tests driving the router through complete conversations
//! over the in-memory stores and the recording channel.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{MessageId, UserId};
use domain::{Category, MediaRef, Money, NewProduct, Product};
use engine::{
    FlowId, GatePolicy, InMemoryChannel, InboundEvent, OutboundEffect, Router, RouterConfig,
    Sender, Step,
};
use store::{CartStore, CatalogStore, IdentityStore, InMemoryStores};

struct TestHarness {
    router: Router<InMemoryStores, InMemoryStores, InMemoryStores, InMemoryChannel>,
    stores: Arc<InMemoryStores>,
    channel: Arc<InMemoryChannel>,
    next_inbound_id: AtomicI64,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(RouterConfig {
            operators: vec![UserId::new(900)],
            broadcast_delay: Duration::ZERO,
            ..RouterConfig::default()
        })
    }

    fn with_config(config: RouterConfig) -> Self {
        let stores = Arc::new(InMemoryStores::new());
        let channel = Arc::new(InMemoryChannel::new());
        let router = Router::new(
            Arc::clone(&stores),
            Arc::clone(&stores),
            Arc::clone(&stores),
            Arc::clone(&channel),
            config,
        );
        Self {
            router,
            stores,
            channel,
            next_inbound_id: AtomicI64::new(10_000),
        }
    }

    fn customer(&self, id: i64) -> Sender {
        Sender::new(UserId::new(id), format!("customer-{id}"))
    }

    fn operator(&self) -> Sender {
        Sender::new(UserId::new(900), "operator").as_operator()
    }

    fn inbound_id(&self) -> MessageId {
        MessageId::new(self.next_inbound_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn seed_product(&self, name: &str, category: Category, price_units: i64) -> Product {
        self.stores
            .create(NewProduct::new(
                name,
                "seeded",
                Money::from_units(price_units),
                category,
                "file-seed",
            ))
            .await
            .unwrap()
    }

    async fn command(&self, sender: &Sender, name: &str) {
        self.router
            .handle(InboundEvent::command(sender.clone(), self.inbound_id(), name))
            .await
            .unwrap();
    }

    async fn text(&self, sender: &Sender, text: &str) {
        self.router
            .handle(InboundEvent::text(sender.clone(), self.inbound_id(), text))
            .await
            .unwrap();
    }

    /// Sends a text event and returns the inbound message id it carried.
    async fn text_with_id(&self, sender: &Sender, text: &str) -> MessageId {
        let id = self.inbound_id();
        self.router
            .handle(InboundEvent::text(sender.clone(), id, text))
            .await
            .unwrap();
        id
    }

    async fn button(&self, sender: &Sender, payload: &str) {
        self.router
            .handle(InboundEvent::button(
                sender.clone(),
                self.inbound_id(),
                payload,
            ))
            .await
            .unwrap();
    }

    async fn button_on(&self, sender: &Sender, message: MessageId, payload: &str) {
        self.router
            .handle(InboundEvent::button(sender.clone(), message, payload))
            .await
            .unwrap();
    }

    async fn media(&self, sender: &Sender, file_id: &str) {
        self.router
            .handle(InboundEvent::media(
                sender.clone(),
                self.inbound_id(),
                MediaRef::new(file_id),
            ))
            .await
            .unwrap();
    }

    fn step_of(&self, user: UserId) -> Option<(FlowId, Step)> {
        self.router
            .registry()
            .read(user)
            .map(|state| (state.flow, state.step))
    }
}

#[tokio::test]
async fn start_registers_user_and_shows_menu() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);

    harness.command(&alice, "start").await;
    harness.command(&alice, "start").await;

    assert_eq!(harness.stores.count().await.unwrap(), 1);
    let texts = harness.channel.texts_to(alice.id).await;
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("Welcome"));
}

#[tokio::test]
async fn new_intent_overwrites_active_flow() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);
    let product = harness.seed_product("Pixel 9", Category::Phones, 500).await;

    harness.button(&alice, "search").await;
    assert_eq!(
        harness.step_of(alice.id),
        Some((FlowId::Search, Step::AwaitingQuery))
    );

    // pressing add-to-cart mid-search starts the quantity flow instead
    harness
        .button(&alice, &format!("add:{}", product.id))
        .await;
    assert_eq!(
        harness.step_of(alice.id),
        Some((FlowId::Quantity, Step::AwaitingQuantity))
    );
}

#[tokio::test]
async fn repeat_adds_accumulate_and_checkout_sends_order() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);
    let operator_id = UserId::new(900);
    let product = harness.seed_product("Pixel 9", Category::Phones, 500).await;

    // add twice: 2 then 3, one line of 5
    harness
        .button(&alice, &format!("add:{}", product.id))
        .await;
    harness.text(&alice, "2").await;
    harness
        .button(&alice, &format!("add:{}", product.id))
        .await;
    harness.text(&alice, "3").await;

    let lines = harness.stores.list_for_user(alice.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);

    harness.button(&alice, "checkout").await;
    assert_eq!(
        harness.step_of(alice.id),
        Some((FlowId::Checkout, Step::AwaitingName))
    );
    harness.text(&alice, "Alice").await;
    harness.text(&alice, "+996700123456").await;

    assert_eq!(harness.step_of(alice.id), None);
    assert!(harness.stores.list_for_user(alice.id).await.unwrap().is_empty());

    let order = harness.channel.texts_to(operator_id).await;
    assert_eq!(order.len(), 1);
    assert!(order[0].contains("Alice"));
    assert!(order[0].contains("+996700123456"));
    assert!(order[0].contains("Pixel 9 x5 = 2500"));

    let confirmations = harness.channel.texts_to(alice.id).await;
    assert!(confirmations.iter().any(|t| t.contains("Order placed")));
}

#[tokio::test]
async fn bad_quantity_reprompts_without_touching_cart() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);
    let product = harness.seed_product("Pixel 9", Category::Phones, 500).await;

    harness
        .button(&alice, &format!("add:{}", product.id))
        .await;
    harness.text(&alice, "zero").await;
    harness.text(&alice, "0").await;

    assert_eq!(
        harness.step_of(alice.id),
        Some((FlowId::Quantity, Step::AwaitingQuantity))
    );
    assert!(harness.stores.list_for_user(alice.id).await.unwrap().is_empty());

    harness.text(&alice, "4").await;
    assert_eq!(harness.step_of(alice.id), None);
    let lines = harness.stores.list_for_user(alice.id).await.unwrap();
    assert_eq!(lines[0].quantity, 4);
}

#[tokio::test]
async fn clearing_an_empty_cart_is_harmless() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);

    harness.button(&alice, "cart:clear").await;
    harness.button(&alice, "cart:clear").await;

    let texts = harness.channel.texts_to(alice.id).await;
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().all(|t| t.contains("Cart cleared")));
}

#[tokio::test]
async fn empty_cart_checkout_never_starts_the_flow() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);

    harness.button(&alice, "checkout").await;

    assert_eq!(harness.step_of(alice.id), None);
    let texts = harness.channel.texts_to(alice.id).await;
    assert!(texts.iter().any(|t| t.contains("cart is empty")));
}

#[tokio::test]
async fn cancel_mid_checkout_keeps_the_cart() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);
    let product = harness.seed_product("Pixel 9", Category::Phones, 500).await;

    harness
        .button(&alice, &format!("add:{}", product.id))
        .await;
    harness.text(&alice, "2").await;
    harness.button(&alice, "checkout").await;
    harness.text(&alice, "Alice").await;
    harness.command(&alice, "stop").await;

    assert_eq!(harness.step_of(alice.id), None);
    let texts = harness.channel.texts_to(alice.id).await;
    assert!(texts.iter().any(|t| t.contains("Cancelled")));

    // abandoning the checkout drops the captured name, not the cart
    let lines = harness.stores.list_for_user(alice.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);
    assert!(harness.channel.texts_to(UserId::new(900)).await.is_empty());
}

#[tokio::test]
async fn phone_validation_blocks_until_a_valid_number() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);
    let product = harness.seed_product("Pixel 9", Category::Phones, 500).await;

    harness
        .button(&alice, &format!("add:{}", product.id))
        .await;
    harness.text(&alice, "1").await;
    harness.button(&alice, "checkout").await;
    harness.text(&alice, "Alice").await;

    harness.text(&alice, "abc123").await;
    assert_eq!(
        harness.step_of(alice.id),
        Some((FlowId::Checkout, Step::AwaitingPhone))
    );

    harness.text(&alice, "996 700 123456").await;
    assert_eq!(harness.step_of(alice.id), None);
    let order = harness.channel.texts_to(UserId::new(900)).await;
    assert!(order[0].contains("996 700 123456"));
}

#[tokio::test]
async fn page_turns_edit_in_place_and_clamp_with_a_toast() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);
    harness.seed_product("Pixel 9", Category::Phones, 500).await;
    harness.seed_product("Pixel 8a", Category::Phones, 400).await;

    harness.button(&alice, "cat:phones").await;
    let card_id = match harness.channel.effects().await.last() {
        Some(OutboundEffect::Media { message_id, .. }) => *message_id,
        other => panic!("expected a product card, got {other:?}"),
    };

    harness.button_on(&alice, card_id, "page:phones:1").await;
    let effects = harness.channel.effects().await;
    assert!(matches!(
        effects.last(),
        Some(OutboundEffect::EditMedia { message, caption, .. })
            if *message == card_id && caption.contains("Pixel 8a")
    ));

    // stepping past the end leaves the card alone and toasts
    harness.button_on(&alice, card_id, "page:phones:2").await;
    let toasts = harness.channel.toasts_to(alice.id).await;
    assert_eq!(toasts.len(), 1);

    // "previous" from index zero wraps to usize::MAX and is clamped too
    let prev = format!("page:phones:{}", usize::MAX);
    harness.button_on(&alice, card_id, &prev).await;
    assert_eq!(harness.channel.toasts_to(alice.id).await.len(), 2);
}

#[tokio::test]
async fn search_walks_prompt_query_results() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);
    harness.seed_product("Pixel 9", Category::Phones, 500).await;
    harness
        .seed_product("Pixel Buds", Category::Accessories, 80)
        .await;

    harness.button(&alice, "search").await;
    harness.text(&alice, "pixel").await;

    assert_eq!(harness.step_of(alice.id), None);
    let effects = harness.channel.effects().await;
    assert!(matches!(
        effects.last(),
        Some(OutboundEffect::Media { caption, .. }) if caption.contains("1 of 2")
    ));

    harness.button(&alice, "search").await;
    harness.text(&alice, "tablet").await;
    let texts = harness.channel.texts_to(alice.id).await;
    assert!(texts.iter().any(|t| t.contains("Nothing found")));
}

#[tokio::test]
async fn cancel_ends_any_flow() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);

    harness.button(&alice, "search").await;
    harness.command(&alice, "stop").await;

    assert_eq!(harness.step_of(alice.id), None);
    let texts = harness.channel.texts_to(alice.id).await;
    assert!(texts.iter().any(|t| t.contains("Cancelled")));
}

#[tokio::test]
async fn privileged_buttons_are_invisible_to_customers() {
    let harness = TestHarness::new();
    let alice = harness.customer(1);

    harness.button(&alice, "admin:broadcast").await;

    assert_eq!(harness.step_of(alice.id), None);
    let texts = harness.channel.texts_to(alice.id).await;
    assert!(texts.iter().any(|t| t.contains("didn't understand")));
}

#[tokio::test]
async fn notify_policy_toasts_the_denial() {
    let harness = TestHarness::with_config(RouterConfig {
        gate_policy: GatePolicy::Notify,
        ..RouterConfig::default()
    });
    let alice = harness.customer(1);

    harness.button(&alice, "admin:broadcast").await;

    let toasts = harness.channel.toasts_to(alice.id).await;
    assert_eq!(toasts.len(), 1);
    assert!(harness.channel.texts_to(alice.id).await.is_empty());
}

#[tokio::test]
async fn admin_adds_a_product_end_to_end() {
    let harness = TestHarness::new();
    let operator = harness.operator();

    harness.button(&operator, "admin:add").await;
    harness.text(&operator, "Pixel Buds").await;
    harness.text(&operator, "Wireless earbuds").await;

    // bad price reprompts in place
    harness.text(&operator, "cheap").await;
    assert_eq!(
        harness.step_of(operator.id),
        Some((FlowId::AddProduct, Step::AwaitingProductPrice))
    );
    harness.text(&operator, "10.50").await;

    harness.button(&operator, "cat:accessories").await;
    harness.media(&operator, "file-buds").await;

    let draft_id = match harness.channel.effects().await.last() {
        Some(OutboundEffect::Media { message_id, .. }) => *message_id,
        other => panic!("expected the draft card, got {other:?}"),
    };
    harness.button_on(&operator, draft_id, "product:commit").await;

    assert_eq!(harness.step_of(operator.id), None);
    let products = harness
        .stores
        .find_by_category(Category::Accessories)
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Pixel Buds");
    assert_eq!(products[0].price, Money::from_minor(1050));
    assert_eq!(products[0].media, MediaRef::new("file-buds"));

    // the draft card turns into a receipt instead of a new message
    let effects = harness.channel.effects().await;
    assert!(matches!(
        effects.last(),
        Some(OutboundEffect::EditCaption { message, caption, keyboard, .. })
            if *message == draft_id && caption.contains("Product added: Pixel Buds") && keyboard.is_none()
    ));
}

#[tokio::test]
async fn discarding_a_draft_leaves_the_catalog_untouched() {
    let harness = TestHarness::new();
    let operator = harness.operator();

    harness.button(&operator, "admin:add").await;
    harness.text(&operator, "Ghost").await;
    harness.text(&operator, "Never happens").await;
    harness.text(&operator, "100").await;
    harness.button(&operator, "cat:phones").await;
    harness.media(&operator, "file-ghost").await;
    harness.button(&operator, "product:discard").await;

    assert_eq!(harness.step_of(operator.id), None);
    assert_eq!(harness.stores.product_count().await, 0);
}

#[tokio::test]
async fn remove_flow_on_empty_category_ends_immediately() {
    let harness = TestHarness::new();
    let operator = harness.operator();

    harness.button(&operator, "admin:remove").await;
    harness.button(&operator, "cat:phones").await;

    assert_eq!(harness.step_of(operator.id), None);
    let texts = harness.channel.texts_to(operator.id).await;
    assert!(texts.iter().any(|t| t.contains("No products in Phones")));
}

#[tokio::test]
async fn remove_flow_deletes_once_and_ends() {
    let harness = TestHarness::new();
    let operator = harness.operator();
    let first = harness.seed_product("Pixel 9", Category::Phones, 500).await;
    let second = harness.seed_product("Pixel 8a", Category::Phones, 400).await;

    harness.button(&operator, "admin:remove").await;
    harness.button(&operator, "cat:phones").await;

    let listing_id = match harness.channel.effects().await.last() {
        Some(OutboundEffect::Text { message_id, .. }) => *message_id,
        other => panic!("expected the removal listing, got {other:?}"),
    };

    harness
        .button_on(&operator, listing_id, &format!("del:{}", first.id))
        .await;

    // one deletion finishes the flow; the listing becomes a receipt
    assert!(harness.stores.find_by_id(first.id).await.unwrap().is_none());
    assert!(harness.stores.find_by_id(second.id).await.unwrap().is_some());
    assert_eq!(harness.step_of(operator.id), None);
    let effects = harness.channel.effects().await;
    assert!(matches!(
        effects.last(),
        Some(OutboundEffect::EditText { message, text, keyboard, .. })
            if *message == listing_id && text.contains("Removed Pixel 9") && keyboard.is_none()
    ));

    // a second press on the stale listing is just a stray button
    harness
        .button_on(&operator, listing_id, &format!("del:{}", second.id))
        .await;
    assert!(harness.stores.find_by_id(second.id).await.unwrap().is_some());
}

#[tokio::test]
async fn broadcast_counts_failures_without_aborting() {
    let harness = TestHarness::new();
    let operator = harness.operator();

    for id in 1..=3 {
        let customer = harness.customer(id);
        harness.command(&customer, "start").await;
    }
    harness.command(&operator, "start").await;
    harness.channel.set_fail_for(UserId::new(2)).await;

    harness.button(&operator, "admin:broadcast").await;
    let source = harness.text_with_id(&operator, "Big sale today!").await;

    assert_eq!(
        harness.step_of(operator.id),
        Some((FlowId::BroadcastAll, Step::AwaitingBroadcastConfirm))
    );
    harness.button(&operator, "broadcast:confirm").await;
    assert_eq!(harness.step_of(operator.id), None);

    let effects = harness.channel.effects().await;
    let copies: Vec<_> = effects
        .iter()
        .filter(|e| matches!(e, OutboundEffect::Copy { message, .. } if *message == source))
        .collect();
    // preview to the operator plus three successful deliveries
    assert_eq!(copies.len(), 4);

    let final_status = effects
        .iter()
        .rev()
        .find_map(|e| match e {
            OutboundEffect::EditText { text, .. } => Some(text.clone()),
            _ => None,
        })
        .expect("broadcast status edits");
    assert_eq!(final_status, "Broadcast finished: 3 sent, 1 failed of 4");
}

#[tokio::test]
async fn direct_message_previews_and_waits_for_confirmation() {
    let harness = TestHarness::new();
    let operator = harness.operator();
    let bob = harness.customer(2);
    harness.command(&bob, "start").await;

    harness.button(&operator, "admin:direct").await;
    harness.text(&operator, "2").await;
    let source = harness.text_with_id(&operator, "Your order is ready").await;

    // content is mirrored back to the operator, nothing reaches the
    // target until the explicit confirm
    assert_eq!(
        harness.step_of(operator.id),
        Some((FlowId::BroadcastById, Step::AwaitingBroadcastConfirm))
    );
    let effects = harness.channel.effects().await;
    let copies_of = |to: UserId, effects: &[OutboundEffect]| {
        effects
            .iter()
            .filter(|e| {
                matches!(e, OutboundEffect::Copy { message, to: t, .. }
                    if *message == source && *t == to)
            })
            .count()
    };
    assert_eq!(copies_of(operator.id, &effects), 1);
    assert_eq!(copies_of(bob.id, &effects), 0);

    harness.button(&operator, "broadcast:confirm").await;
    assert_eq!(harness.step_of(operator.id), None);
    let effects = harness.channel.effects().await;
    assert_eq!(copies_of(bob.id, &effects), 1);
    let texts = harness.channel.texts_to(operator.id).await;
    assert!(texts.iter().any(|t| t.contains("Delivered")));
}

#[tokio::test]
async fn direct_message_reports_delivery_failure() {
    let harness = TestHarness::new();
    let operator = harness.operator();
    let bob = harness.customer(2);
    harness.command(&bob, "start").await;
    harness.channel.set_fail_for(bob.id).await;

    harness.button(&operator, "admin:direct").await;
    harness.text(&operator, "2").await;
    harness.text(&operator, "Your order is ready").await;
    harness.button(&operator, "broadcast:confirm").await;

    assert_eq!(harness.step_of(operator.id), None);
    let texts = harness.channel.texts_to(operator.id).await;
    assert!(texts.iter().any(|t| t.contains("Could not deliver to 2")));
}

#[tokio::test]
async fn stale_flow_buttons_fall_through_to_fallback() {
    let harness = TestHarness::new();
    let operator = harness.operator();

    // confirm button with no broadcast in progress
    harness.button(&operator, "broadcast:confirm").await;

    let texts = harness.channel.texts_to(operator.id).await;
    assert!(texts.iter().any(|t| t.contains("didn't understand")));
}

#[tokio::test]
async fn user_listing_pages_and_summarizes() {
    let harness = TestHarness::with_config(RouterConfig {
        operators: vec![UserId::new(900)],
        users_page_size: 2,
        ..RouterConfig::default()
    });
    let operator = harness.operator();
    for id in 1..=3 {
        let customer = harness.customer(id);
        harness.command(&customer, "start").await;
    }

    harness.button(&operator, "admin:users").await;
    let page_id = match harness.channel.effects().await.last() {
        Some(OutboundEffect::Text { message_id, .. }) => *message_id,
        other => panic!("expected the user listing, got {other:?}"),
    };

    harness.button_on(&operator, page_id, "users:page:1").await;
    let effects = harness.channel.effects().await;
    assert!(matches!(
        effects.last(),
        Some(OutboundEffect::EditText { message, text, .. })
            if *message == page_id && text.contains("page 2")
    ));

    // a page past the end only toasts
    harness.button_on(&operator, page_id, "users:page:5").await;
    assert_eq!(harness.channel.toasts_to(operator.id).await.len(), 1);

    harness.button(&operator, "users:summary").await;
    let texts = harness.channel.texts_to(operator.id).await;
    assert!(texts.iter().any(|t| t.contains("Total users: 3")));
}

#[tokio::test]
async fn empty_user_table_gets_a_notice_instead_of_a_bare_header() {
    let harness = TestHarness::new();
    let operator = harness.operator();

    harness.button(&operator, "admin:users").await;

    let texts = harness.channel.texts_to(operator.id).await;
    assert_eq!(texts, vec!["No users registered yet.".to_string()]);
    assert!(harness.channel.toasts_to(operator.id).await.is_empty());
}
