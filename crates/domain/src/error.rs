//! Domain validation error types.

use thiserror::Error;

/// Errors produced when validating step input.
///
/// These are recoverable by design: the owning flow re-prompts the user
/// and stays on the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Quantity input did not parse as a positive whole number.
    #[error("quantity must be a positive whole number")]
    InvalidQuantity,

    /// Phone input contained characters other than digits, spaces, and a `+`.
    #[error("phone number must contain only digits, spaces, and '+'")]
    InvalidPhone,

    /// Price input did not parse as a non-negative decimal.
    #[error("price must be a non-negative number with at most two decimal places")]
    InvalidPrice,

    /// User id input did not parse as a numeric id.
    #[error("user id must be a whole number")]
    InvalidUserId,
}
