//! Storage layer for the conversational commerce engine.
//!
//! Each concern is described by an async trait (`CatalogStore`,
//! `CartStore`, `IdentityStore`). Two implementations are provided:
//! [`InMemoryStores`] backs the test suites and local runs, and
//! [`SqliteStores`] persists to SQLite through `sqlx`. Both implement all
//! three traits over a single shared backing store, so a cart listing can
//! join against the catalog the same way in either.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod memory;
pub mod sqlite;

pub use cart::CartStore;
pub use catalog::{CatalogStore, CatalogStoreExt};
pub use error::{Result, StoreError};
pub use identity::IdentityStore;
pub use memory::InMemoryStores;
pub use sqlite::SqliteStores;
