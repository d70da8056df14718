use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::{CartLine, Category, Money, NewProduct, Product, ProductId, User};
use sqlx::{Row, SqlitePool, sqlite::SqlitePoolOptions, sqlite::SqliteRow};

use crate::{CartStore, CatalogStore, IdentityStore, Result, StoreError};

/// SQLite-backed implementation of all three store traits.
#[derive(Clone)]
pub struct SqliteStores {
    pool: SqlitePool,
}

impl SqliteStores {
    /// Connects to the given SQLite database and creates the schema.
    ///
    /// The pool is limited to one connection: SQLite serializes writers
    /// anyway, and `sqlite::memory:` databases exist per connection.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;
        let stores = Self { pool };
        stores.init_schema().await?;
        Ok(stores)
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER UNIQUE NOT NULL,
                name TEXT NOT NULL,
                handle TEXT,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                price INTEGER NOT NULL,
                category TEXT NOT NULL,
                media TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cart (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                product_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                UNIQUE (user_id, product_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_product(row: &SqliteRow) -> Result<Product> {
        let category_token: String = row.try_get("category")?;
        let category =
            Category::from_token(&category_token).ok_or_else(|| StoreError::InvalidColumn {
                column: "category",
                value: category_token.clone(),
            })?;

        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_minor(row.try_get("price")?),
            category,
            media: row.try_get::<String, _>("media")?.into(),
        })
    }
}

#[async_trait]
impl CatalogStore for SqliteStores {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, category, media)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.minor())
        .bind(product.category.as_str())
        .bind(product.media.as_str())
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: ProductId::new(result.last_insert_rowid()),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            media: product.media,
        })
    }

    async fn find_by_category(&self, category: Category) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, category, media
            FROM products
            WHERE category = ?
            ORDER BY id ASC
            "#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price, category, media
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn delete(&self, id: ProductId) -> Result<()> {
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CartStore for SqliteStores {
    async fn add_or_accumulate(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated =
            sqlx::query("UPDATE cart SET quantity = quantity + ? WHERE user_id = ? AND product_id = ?")
                .bind(quantity as i64)
                .bind(user.as_i64())
                .bind(product.as_i64())
                .execute(&mut *tx)
                .await?;

        if updated.rows_affected() == 0 {
            sqlx::query("INSERT INTO cart (user_id, product_id, quantity) VALUES (?, ?, ?)")
                .bind(user.as_i64())
                .bind(product.as_i64())
                .bind(quantity as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description, p.price, p.category, p.media, c.quantity
            FROM cart c
            JOIN products p ON c.product_id = p.id
            WHERE c.user_id = ?
            ORDER BY c.id ASC
            "#,
        )
        .bind(user.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let product = Self::row_to_product(row)?;
                let quantity: i64 = row.try_get("quantity")?;
                Ok(CartLine::new(product, quantity as u32))
            })
            .collect()
    }

    async fn clear(&self, user: UserId) -> Result<()> {
        sqlx::query("DELETE FROM cart WHERE user_id = ?")
            .bind(user.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for SqliteStores {
    async fn register(&self, user: User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (chat_id, name, handle, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user.id.as_i64())
        .bind(&user.name)
        .bind(&user.handle)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: UserId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE chat_id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn list_ids(&self) -> Result<Vec<UserId>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT chat_id FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }

    async fn list_page(&self, offset: u64, size: u64) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT chat_id, name, handle, created_at
            FROM users
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(size as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(User {
                    id: UserId::new(row.try_get("chat_id")?),
                    name: row.try_get("name")?,
                    handle: row.try_get("handle")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
