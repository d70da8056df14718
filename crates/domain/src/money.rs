//! Money amounts for catalog prices.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Money amount represented in minor units to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g., 1050 = 10.50).
    minor: i64,
}

impl Money {
    /// Creates a new Money amount from minor units.
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates a new Money amount from whole units.
    pub fn from_units(units: i64) -> Self {
        Self { minor: units * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.minor / 100
    }

    /// Returns the minor-unit remainder after whole units.
    pub fn minor_part(&self) -> i64 {
        self.minor.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            minor: self.minor * quantity as i64,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.minor_part() == 0 {
            write!(f, "{}", self.units())
        } else {
            write!(f, "{}.{:02}", self.units(), self.minor_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor + rhs.minor,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.minor += rhs.minor;
    }
}

/// Parses a price as entered by an operator.
///
/// Accepts a non-negative decimal with at most two fraction digits
/// (`"1000"`, `"999.99"`, `"0.5"`). Anything else is rejected so invalid
/// prices never reach the catalog.
impl std::str::FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (units_str, frac_str) = match s.split_once('.') {
            Some((u, f)) => (u, Some(f)),
            None => (s, None),
        };

        if units_str.is_empty() || !units_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPrice);
        }
        let units: i64 = units_str
            .parse()
            .map_err(|_| ValidationError::InvalidPrice)?;

        let minor_part = match frac_str {
            None => 0,
            Some(f) => {
                if f.is_empty() || f.len() > 2 || !f.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ValidationError::InvalidPrice);
                }
                let parsed: i64 = f.parse().map_err(|_| ValidationError::InvalidPrice)?;
                if f.len() == 1 { parsed * 10 } else { parsed }
            }
        };

        units
            .checked_mul(100)
            .and_then(|m| m.checked_add(minor_part))
            .map(Money::from_minor)
            .ok_or(ValidationError::InvalidPrice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_from_minor() {
        let money = Money::from_minor(1234);
        assert_eq!(money.minor(), 1234);
        assert_eq!(money.units(), 12);
        assert_eq!(money.minor_part(), 34);
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_minor(123400).to_string(), "1234");
        assert_eq!(Money::from_minor(1050).to_string(), "10.50");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
    }

    #[test]
    fn money_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);
        assert_eq!((a + b).minor(), 1500);
        assert_eq!(a.multiply(3).minor(), 3000);
    }

    #[test]
    fn parse_whole_units() {
        let money: Money = "1000".parse().unwrap();
        assert_eq!(money, Money::from_units(1000));
    }

    #[test]
    fn parse_with_fraction() {
        assert_eq!("999.99".parse::<Money>().unwrap(), Money::from_minor(99999));
        assert_eq!("0.5".parse::<Money>().unwrap(), Money::from_minor(50));
        assert_eq!(" 12.00 ".parse::<Money>().unwrap(), Money::from_units(12));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("-5".parse::<Money>().is_err());
        assert!("1.234".parse::<Money>().is_err());
        assert!("1.".parse::<Money>().is_err());
        assert!("1,50".parse::<Money>().is_err());
    }

    #[test]
    fn serialization_roundtrip() {
        let money = Money::from_minor(4990);
        let json = serde_json::to_string(&money).unwrap();
        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(money, deserialized);
    }
}
