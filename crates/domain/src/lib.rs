//! Domain layer for the conversational commerce engine.
//!
//! This crate provides the core domain types:
//! - Product catalog types (`Product`, `Category`, `Money`)
//! - User and cart types (`User`, `CartLine`)
//! - Step-input validation returning typed errors instead of panicking

pub mod error;
pub mod money;
pub mod product;
pub mod user;
pub mod validate;

pub use error::ValidationError;
pub use money::Money;
pub use product::{Category, MediaRef, NewProduct, Product, ProductId};
pub use user::{CartLine, User};
pub use validate::{parse_phone, parse_quantity, parse_user_id};
