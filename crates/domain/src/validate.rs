//! Step-input validation.
//!
//! Every multi-step flow validates free-text input through these
//! functions and branches on the returned `Result`; a parse failure is an
//! expected outcome, never a raised fault.

use common::UserId;

use crate::error::ValidationError;

/// Parses an order quantity: a positive whole number.
pub fn parse_quantity(input: &str) -> Result<u32, ValidationError> {
    let quantity: u32 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidQuantity)?;
    if quantity == 0 {
        return Err(ValidationError::InvalidQuantity);
    }
    Ok(quantity)
}

/// Validates a phone number as entered.
///
/// After stripping `+` and spaces, all remaining characters must be digits
/// and at least one digit must remain. Returns the trimmed input so the
/// order summary shows the number the way the user wrote it.
pub fn parse_phone(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let digits: String = trimmed.chars().filter(|c| *c != '+' && *c != ' ').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(trimmed.to_string())
}

/// Parses a broadcast target user id.
pub fn parse_user_id(input: &str) -> Result<UserId, ValidationError> {
    input
        .trim()
        .parse::<i64>()
        .map(UserId::new)
        .map_err(|_| ValidationError::InvalidUserId)
}
