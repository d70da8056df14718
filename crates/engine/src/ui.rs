//! Message text and keyboard rendering.
//!
//! Pure functions only. Flows decide what to say; this module decides
//! how it looks.

use domain::{CartLine, Category, Money, Product, ProductId};

use crate::action::Action;
use crate::channel::{Button, Keyboard};

pub const WELCOME: &str = "Welcome to the store! Pick an option below.";
pub const ABOUT: &str =
    "We sell phones and accessories with delivery across the city.\nOrders are confirmed by an operator within minutes.";
pub const FALLBACK: &str = "I didn't understand that. Use /start to open the menu.";
pub const CANCELLED: &str = "Cancelled. Use /start to open the menu.";
pub const NOT_ALLOWED: &str = "This action is only available to operators.";
pub const SEARCH_PROMPT: &str = "What are you looking for? Send a name or part of it.";
pub const EMPTY_CART: &str = "Your cart is empty.";
pub const CART_CLEARED: &str = "Cart cleared.";
pub const CHECKOUT_NAME_PROMPT: &str = "What name should the order be under?";
pub const CHECKOUT_PHONE_PROMPT: &str = "Send a contact phone number.";
pub const QUANTITY_PROMPT: &str = "How many would you like? Send a number.";
pub const BAD_QUANTITY: &str = "Please send a whole number greater than zero.";
pub const BAD_PHONE: &str = "That doesn't look like a phone number. Try again.";
pub const ADDED_TO_CART: &str = "Added to cart.";
pub const ORDER_PLACED: &str = "Order placed! An operator will contact you shortly.";
pub const PAGE_OUT_OF_RANGE: &str = "No more items in this direction.";
pub const NO_USERS: &str = "No users registered yet.";

/// Top-level menu shown on /start.
pub fn main_menu(is_operator: bool) -> Keyboard {
    let mut kb = Keyboard::new()
        .row(vec![
            Button::new("🛍 Products", Action::Products),
            Button::new("🔍 Search", Action::Search),
        ])
        .row(vec![
            Button::new("🛒 Cart", Action::ViewCart),
            Button::new("ℹ️ About", Action::About),
        ]);
    if is_operator {
        kb = kb.button("⚙️ Admin", Action::AdminUsers);
    }
    kb
}

/// Category picker shown when browsing starts.
pub fn category_picker() -> Keyboard {
    let row = Category::ALL
        .iter()
        .map(|c| Button::new(c.label(), Action::Category(*c)))
        .collect();
    Keyboard::new().row(row).button("⬅️ Menu", Action::Menu)
}

/// Operator menu shown on /admin.
pub fn admin_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("➕ Add product", Action::AdminAddProduct),
            Button::new("🗑 Remove product", Action::AdminRemoveProduct),
        ])
        .row(vec![
            Button::new("👥 Users", Action::AdminUsers),
            Button::new("📢 Broadcast", Action::AdminBroadcastAll),
        ])
        .button("✉️ Message a user", Action::AdminBroadcastById)
}

/// Caption for one product card.
pub fn product_caption(product: &Product, position: usize, total: usize) -> String {
    format!(
        "{}\n\n{}\n\nPrice: {} ({} of {})",
        product.name,
        product.description,
        product.price,
        position + 1,
        total
    )
}

/// Keyboard for one page of a category browse.
pub fn browse_controls(category: Category, index: usize, total: usize, id: ProductId) -> Keyboard {
    let mut nav = Vec::new();
    if total > 1 {
        nav.push(Button::new(
            "⬅️",
            Action::Page {
                category,
                index: index.wrapping_sub(1),
            },
        ));
        nav.push(Button::new(
            "➡️",
            Action::Page {
                category,
                index: index + 1,
            },
        ));
    }
    let mut kb = Keyboard::new();
    if !nav.is_empty() {
        kb = kb.row(nav);
    }
    kb.button("🛒 Add to cart", Action::AddToCart(id))
        .button("⬅️ Categories", Action::Products)
}

/// Keyboard for one page of search results.
pub fn search_controls(query: &str, index: usize, total: usize, id: ProductId) -> Keyboard {
    let mut nav = Vec::new();
    if total > 1 {
        nav.push(Button::new(
            "⬅️",
            Action::SearchNav {
                query: query.to_string(),
                index: index.wrapping_sub(1),
            },
        ));
        nav.push(Button::new(
            "➡️",
            Action::SearchNav {
                query: query.to_string(),
                index: index + 1,
            },
        ));
    }
    let mut kb = Keyboard::new();
    if !nav.is_empty() {
        kb = kb.row(nav);
    }
    kb.button("🛒 Add to cart", Action::AddToCart(id))
        .button("⬅️ Menu", Action::Menu)
}

/// Cart summary text with a line per product and a grand total.
pub fn cart_summary(lines: &[CartLine]) -> String {
    let mut out = String::from("Your cart:\n");
    let mut total = Money::zero();
    for line in lines {
        let line_total = line.total_price();
        out.push_str(&format!(
            "\n{} x{} = {}",
            line.product.name, line.quantity, line_total
        ));
        total += line_total;
    }
    out.push_str(&format!("\n\nTotal: {total}"));
    out
}

/// Keyboard under the cart summary.
pub fn cart_controls() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("✅ Checkout", Action::Checkout),
            Button::new("🗑 Clear", Action::ClearCart),
        ])
        .button("⬅️ Menu", Action::Menu)
}

/// Order summary shown to operators when a checkout completes.
pub fn order_notice(
    name: &str,
    phone: &str,
    customer: common::UserId,
    handle: Option<&str>,
    lines: &[CartLine],
) -> String {
    let mut out = match handle {
        Some(handle) => format!("New order from {customer} (@{handle})\n"),
        None => format!("New order from {customer}\n"),
    };
    out.push_str(&format!("Name: {name}\nPhone: {phone}\n"));
    let mut total = Money::zero();
    for (i, line) in lines.iter().enumerate() {
        let line_total = line.total_price();
        out.push_str(&format!(
            "\n{}. {} x{} = {}",
            i + 1,
            line.product.name,
            line.quantity,
            line_total
        ));
        total += line_total;
    }
    out.push_str(&format!("\n\nTotal: {total}"));
    out
}

/// Draft summary shown before an operator commits a new product.
pub fn product_draft_summary(
    name: &str,
    description: &str,
    price: Money,
    category: Category,
) -> String {
    format!(
        "About to add:\n\n{name}\n{description}\nPrice: {price}\nCategory: {}",
        category.label()
    )
}

/// Confirm/discard keyboard for the product draft.
pub fn product_confirm_controls() -> Keyboard {
    Keyboard::new().row(vec![
        Button::new("✅ Save", Action::ConfirmProduct),
        Button::new("❌ Discard", Action::DiscardProduct),
    ])
}

/// Numbered listing of removable products, one button each.
pub fn removal_listing(products: &[Product]) -> (String, Keyboard) {
    let mut text = String::from("Pick a product to remove:\n");
    let mut kb = Keyboard::new();
    for (i, product) in products.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {} ({})",
            i + 1,
            product.name,
            product.price
        ));
        kb = kb.button(format!("{}", i + 1), Action::RemoveProduct(product.id));
    }
    (text, kb)
}

/// Confirm keyboard for a pending broadcast.
pub fn broadcast_confirm_controls() -> Keyboard {
    Keyboard::new().row(vec![
        Button::new("✅ Send", Action::ConfirmBroadcast),
        Button::new("❌ Cancel", Action::Cancel),
    ])
}

/// Progress line edited into the broadcast status message.
pub fn broadcast_progress(sent: usize, failed: usize, total: usize) -> String {
    format!("Broadcasting: {sent} sent, {failed} failed of {total}")
}

/// Final broadcast status line.
pub fn broadcast_done(sent: usize, failed: usize, total: usize) -> String {
    format!("Broadcast finished: {sent} sent, {failed} failed of {total}")
}

/// One page of the registered-user listing.
pub fn users_page_text(ids: &[common::UserId], page: usize) -> String {
    let mut out = format!("Users (page {}):\n", page + 1);
    for id in ids {
        out.push_str(&format!("\n{id}"));
    }
    out
}

/// Paging keyboard for the user listing.
pub fn users_page_controls(page: usize, has_next: bool) -> Keyboard {
    let mut nav = Vec::new();
    if page > 0 {
        nav.push(Button::new("⬅️", Action::UsersPage(page - 1)));
    }
    if has_next {
        nav.push(Button::new("➡️", Action::UsersPage(page + 1)));
    }
    let mut kb = Keyboard::new();
    if !nav.is_empty() {
        kb = kb.row(nav);
    }
    kb.button("📊 Summary", Action::UsersSummary)
}

/// User-count summary line.
pub fn users_summary_text(total: u64, last_day: u64) -> String {
    format!("Total users: {total}\nNew in the last 24h: {last_day}")
}
