use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::{CartLine, Category, NewProduct, Product, ProductId, User};
use tokio::sync::RwLock;

use crate::{CartStore, CatalogStore, IdentityStore, Result};

#[derive(Debug, Default)]
struct State {
    // BTreeMap keeps listings in id-assignment order, matching the
    // autoincrement ordering of the SQLite implementation.
    products: BTreeMap<i64, Product>,
    next_product_id: i64,
    users: Vec<User>,
    cart: Vec<CartEntry>,
}

#[derive(Debug, Clone)]
struct CartEntry {
    user: UserId,
    product: ProductId,
    quantity: u32,
}

/// In-memory implementation of all three store traits.
///
/// Backs the test suites and local runs, providing the same interface
/// and ordering guarantees as the SQLite implementation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStores {
    state: Arc<RwLock<State>>,
}

impl InMemoryStores {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of products across all categories.
    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    /// Returns the total number of cart lines across all users.
    pub async fn cart_line_count(&self) -> usize {
        self.state.read().await.cart.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStores {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        state.next_product_id += 1;
        let stored = Product {
            id: ProductId::new(state.next_product_id),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            media: product.media,
        };
        state.products.insert(stored.id.as_i64(), stored.clone());
        Ok(stored)
    }

    async fn find_by_category(&self, category: Category) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.get(&id.as_i64()).cloned())
    }

    async fn delete(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.remove(&id.as_i64());
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryStores {
    async fn add_or_accumulate(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        match state
            .cart
            .iter_mut()
            .find(|e| e.user == user && e.product == product)
        {
            Some(entry) => entry.quantity += quantity,
            None => state.cart.push(CartEntry {
                user,
                product,
                quantity,
            }),
        }
        Ok(())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<CartLine>> {
        let state = self.state.read().await;
        // Lines whose product was deleted after the add are dropped here,
        // same as the SQL join.
        Ok(state
            .cart
            .iter()
            .filter(|e| e.user == user)
            .filter_map(|e| {
                state
                    .products
                    .get(&e.product.as_i64())
                    .map(|p| CartLine::new(p.clone(), e.quantity))
            })
            .collect())
    }

    async fn clear(&self, user: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        state.cart.retain(|e| e.user != user);
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryStores {
    async fn register(&self, user: User) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.id == user.id) {
            return Ok(false);
        }
        state.users.push(user);
        Ok(true)
    }

    async fn exists(&self, id: UserId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.users.iter().any(|u| u.id == id))
    }

    async fn count(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.users.len() as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|u| u.created_at >= since).count() as u64)
    }

    async fn list_ids(&self) -> Result<Vec<UserId>> {
        let state = self.state.read().await;
        Ok(state.users.iter().map(|u| u.id).collect())
    }

    async fn list_page(&self, offset: u64, size: u64) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .skip(offset as usize)
            .take(size as usize)
            .cloned()
            .collect())
    }
}
