//! Typed action payloads carried by button presses.
//!
//! Buttons carry an [`Action`] which is encoded to a stable delimited
//! string at the channel boundary and decoded back on the way in. The
//! encoding must round-trip exactly: cursors for pagination and the
//! identity of a product to delete travel inside the payload itself, so
//! browse and search survive registry loss. Malformed payloads decode to
//! an error and the router treats them as no-match.

use domain::{Category, ProductId};
use thiserror::Error;

/// Error produced when decoding a button payload fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized action payload: {payload}")]
pub struct ActionParseError {
    pub payload: String,
}

/// Every button action the engine understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Menu,
    About,
    Products,
    Search,
    Cancel,

    // Catalog browsing
    Category(Category),
    Page { category: Category, index: usize },
    SearchNav { query: String, index: usize },

    // Cart and checkout
    AddToCart(ProductId),
    ViewCart,
    ClearCart,
    Checkout,

    // Operator-only surface
    AdminAddProduct,
    AdminRemoveProduct,
    AdminUsers,
    AdminBroadcastAll,
    AdminBroadcastById,
    RemoveProduct(ProductId),
    ConfirmProduct,
    DiscardProduct,
    ConfirmBroadcast,
    UsersPage(usize),
    UsersSummary,
}

impl Action {
    /// Encodes the action into its stable payload string.
    pub fn encode(&self) -> String {
        match self {
            Action::Menu => "menu".to_string(),
            Action::About => "about".to_string(),
            Action::Products => "products".to_string(),
            Action::Search => "search".to_string(),
            Action::Cancel => "cancel".to_string(),
            Action::Category(c) => format!("cat:{c}"),
            Action::Page { category, index } => format!("page:{category}:{index}"),
            Action::SearchNav { query, index } => {
                format!("find:{}:{index}", escape(query))
            }
            Action::AddToCart(id) => format!("add:{id}"),
            Action::ViewCart => "cart:view".to_string(),
            Action::ClearCart => "cart:clear".to_string(),
            Action::Checkout => "checkout".to_string(),
            Action::AdminAddProduct => "admin:add".to_string(),
            Action::AdminRemoveProduct => "admin:remove".to_string(),
            Action::AdminUsers => "admin:users".to_string(),
            Action::AdminBroadcastAll => "admin:broadcast".to_string(),
            Action::AdminBroadcastById => "admin:direct".to_string(),
            Action::RemoveProduct(id) => format!("del:{id}"),
            Action::ConfirmProduct => "product:commit".to_string(),
            Action::DiscardProduct => "product:discard".to_string(),
            Action::ConfirmBroadcast => "broadcast:confirm".to_string(),
            Action::UsersPage(page) => format!("users:page:{page}"),
            Action::UsersSummary => "users:summary".to_string(),
        }
    }

    /// Decodes a payload string back into an action.
    pub fn decode(payload: &str) -> Result<Self, ActionParseError> {
        let err = || ActionParseError {
            payload: payload.to_string(),
        };

        match payload {
            "menu" => return Ok(Action::Menu),
            "about" => return Ok(Action::About),
            "products" => return Ok(Action::Products),
            "search" => return Ok(Action::Search),
            "cancel" => return Ok(Action::Cancel),
            "cart:view" => return Ok(Action::ViewCart),
            "cart:clear" => return Ok(Action::ClearCart),
            "checkout" => return Ok(Action::Checkout),
            "admin:add" => return Ok(Action::AdminAddProduct),
            "admin:remove" => return Ok(Action::AdminRemoveProduct),
            "admin:users" => return Ok(Action::AdminUsers),
            "admin:broadcast" => return Ok(Action::AdminBroadcastAll),
            "admin:direct" => return Ok(Action::AdminBroadcastById),
            "product:commit" => return Ok(Action::ConfirmProduct),
            "product:discard" => return Ok(Action::DiscardProduct),
            "broadcast:confirm" => return Ok(Action::ConfirmBroadcast),
            "users:summary" => return Ok(Action::UsersSummary),
            _ => {}
        }

        let (tag, rest) = payload.split_once(':').ok_or_else(err)?;
        match tag {
            "cat" => Category::from_token(rest).map(Action::Category).ok_or_else(err),
            "page" => {
                let (token, index) = rest.split_once(':').ok_or_else(err)?;
                let category = Category::from_token(token).ok_or_else(err)?;
                let index = index.parse().map_err(|_| err())?;
                Ok(Action::Page { category, index })
            }
            "find" => {
                // split from the right: the query is escaped, the index is not
                let (query, index) = rest.rsplit_once(':').ok_or_else(err)?;
                let index = index.parse().map_err(|_| err())?;
                Ok(Action::SearchNav {
                    query: unescape(query).ok_or_else(err)?,
                    index,
                })
            }
            "add" => rest
                .parse()
                .map(|id| Action::AddToCart(ProductId::new(id)))
                .map_err(|_| err()),
            "del" => rest
                .parse()
                .map(|id| Action::RemoveProduct(ProductId::new(id)))
                .map_err(|_| err()),
            "users" => {
                let page = rest.strip_prefix("page:").ok_or_else(err)?;
                page.parse().map(Action::UsersPage).map_err(|_| err())
            }
            _ => Err(err()),
        }
    }

    /// Returns true for actions on the operator-only surface.
    ///
    /// These are excluded from matching for non-privileged senders.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Action::AdminAddProduct
                | Action::AdminRemoveProduct
                | Action::AdminUsers
                | Action::AdminBroadcastAll
                | Action::AdminBroadcastById
                | Action::RemoveProduct(_)
                | Action::ConfirmProduct
                | Action::DiscardProduct
                | Action::ConfirmBroadcast
                | Action::UsersPage(_)
                | Action::UsersSummary
        )
    }
}

/// Escapes the payload delimiter inside free-form text (search queries).
fn escape(text: &str) -> String {
    text.replace('%', "%25").replace(':', "%3A")
}

/// Reverses [`escape`]. Returns None for a dangling escape sequence.
fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let pair: String = chars.by_ref().take(2).collect();
        match pair.as_str() {
            "25" => out.push('%'),
            "3A" => out.push(':'),
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_actions_roundtrip() {
        let actions = [
            Action::Menu,
            Action::About,
            Action::Products,
            Action::Search,
            Action::Cancel,
            Action::ViewCart,
            Action::ClearCart,
            Action::Checkout,
            Action::AdminAddProduct,
            Action::AdminRemoveProduct,
            Action::AdminUsers,
            Action::AdminBroadcastAll,
            Action::AdminBroadcastById,
            Action::ConfirmProduct,
            Action::DiscardProduct,
            Action::ConfirmBroadcast,
            Action::UsersSummary,
        ];
        for action in actions {
            assert_eq!(Action::decode(&action.encode()), Ok(action));
        }
    }

    #[test]
    fn parameterized_actions_roundtrip() {
        let actions = [
            Action::Category(Category::Phones),
            Action::Page {
                category: Category::Accessories,
                index: 3,
            },
            Action::AddToCart(ProductId::new(42)),
            Action::RemoveProduct(ProductId::new(7)),
            Action::UsersPage(5),
        ];
        for action in actions {
            assert_eq!(Action::decode(&action.encode()), Ok(action));
        }
    }

    #[test]
    fn search_query_with_delimiter_roundtrips() {
        let action = Action::SearchNav {
            query: "usb-c: 100% fast".to_string(),
            index: 2,
        };
        let payload = action.encode();
        assert_eq!(Action::decode(&payload), Ok(action));
    }

    #[test]
    fn malformed_payloads_are_errors_not_panics() {
        for payload in [
            "",
            "page",
            "page:phones",
            "page:gadgets:0",
            "page:phones:x",
            "add:abc",
            "find:query",
            "users:page:",
            "bogus:1",
        ] {
            assert!(Action::decode(payload).is_err(), "payload: {payload}");
        }
    }

    #[test]
    fn dangling_escape_is_rejected() {
        assert!(Action::decode("find:%2:0").is_err());
        assert!(Action::decode("find:%ZZ:0").is_err());
    }

    #[test]
    fn privileged_surface_is_flagged() {
        assert!(Action::AdminBroadcastAll.is_privileged());
        assert!(Action::RemoveProduct(ProductId::new(1)).is_privileged());
        assert!(!Action::Menu.is_privileged());
        assert!(!Action::AddToCart(ProductId::new(1)).is_privileged());
    }
}
