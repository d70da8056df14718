use async_trait::async_trait;
use domain::{Category, NewProduct, Product, ProductId};

use crate::Result;

/// CRUD over catalog products, partitioned by category.
///
/// Products are created and deleted only by the admin flows; the engine
/// re-fetches listings on every interaction instead of caching them, so
/// deletions become visible immediately.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persists a new product, assigning its id. Returns the stored record.
    async fn create(&self, product: NewProduct) -> Result<Product>;

    /// Lists all products in a category, in id order.
    async fn find_by_category(&self, category: Category) -> Result<Vec<Product>>;

    /// Looks up a single product. Returns None if it was deleted.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>>;

    /// Deletes a product. Deleting an already-absent id is not an error.
    async fn delete(&self, id: ProductId) -> Result<()>;
}

/// Extension trait providing convenience queries over a catalog store.
#[async_trait]
pub trait CatalogStoreExt: CatalogStore {
    /// Lists every product across all categories, in category order.
    async fn find_all(&self) -> Result<Vec<Product>> {
        let mut all = Vec::new();
        for category in Category::ALL {
            all.extend(self.find_by_category(category).await?);
        }
        Ok(all)
    }

    /// Case-insensitive substring search on product name across all
    /// categories. Re-runs against live data on every call, so paging a
    /// result set reflects concurrent catalog edits.
    async fn search_by_name(&self, query: &str) -> Result<Vec<Product>> {
        let needle = query.to_lowercase();
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect())
    }
}

// Blanket implementation for all CatalogStore implementations
impl<T: CatalogStore + ?Sized> CatalogStoreExt for T {}
