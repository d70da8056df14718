//! Product catalog types.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Unique identifier for a catalog product, assigned by the catalog store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Creates a product ID from a raw id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying numeric id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Catalog category a product belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Phones,
    Accessories,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 2] = [Category::Phones, Category::Accessories];

    /// Returns the stable token used in storage and action payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Phones => "phones",
            Category::Accessories => "accessories",
        }
    }

    /// Parses a stable token back into a category.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "phones" => Some(Category::Phones),
            "accessories" => Some(Category::Accessories),
            _ => None,
        }
    }

    /// Human-readable category label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Phones => "Phones",
            Category::Accessories => "Accessories",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque reference to a media object held by the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    /// Creates a media reference from a channel file id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A product stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    pub media: MediaRef,
}

/// A product record about to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    pub media: MediaRef,
}

impl NewProduct {
    /// Creates a new product record.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: Category,
        media: impl Into<MediaRef>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
            category,
            media: media.into(),
        }
    }
}

impl From<String> for MediaRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_token_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_token(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_token("gadgets"), None);
    }

    #[test]
    fn category_labels() {
        assert_eq!(Category::Phones.label(), "Phones");
        assert_eq!(Category::Accessories.label(), "Accessories");
    }

    #[test]
    fn product_serialization_roundtrip() {
        let product = Product {
            id: ProductId::new(7),
            name: "Pixel 9".to_string(),
            description: "128GB, obsidian".to_string(),
            price: Money::from_units(45000),
            category: Category::Phones,
            media: MediaRef::new("file-123"),
        };
        let json = serde_json::to_string(&product).unwrap();
        let deserialized: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product, deserialized);
    }
}
