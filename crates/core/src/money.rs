//! Money value object: exact decimal, non-negative, checked arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A non-negative monetary amount.
///
/// Single implicit currency. Arithmetic is exact decimal (no floating-point
/// rounding); overflow surfaces as a domain error rather than wrapping.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Construct from a decimal amount. Negative amounts are rejected.
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() {
            return Err(DomainError::validation("amount must not be negative"));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::business_rule("amount overflow"))
    }

    /// Multiply by a quantity (line amount = unit price x quantity).
    pub fn checked_mul_u32(self, quantity: u32) -> DomainResult<Money> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::business_rule("amount overflow"))
    }
}

impl From<u64> for Money {
    fn from(value: u64) -> Self {
        Money(Decimal::from(value))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl ValueObject for Money {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amount_is_rejected() {
        let err = Money::new(Decimal::from(-1)).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("negative")),
            _ => panic!("Expected Validation"),
        }
    }

    #[test]
    fn equal_by_value() {
        assert_eq!(Money::from(100), Money::new(Decimal::from(100)).unwrap());
    }

    #[test]
    fn checked_mul_is_exact_decimal() {
        let price = Money::new("19.99".parse::<Decimal>().unwrap()).unwrap();
        let line = price.checked_mul_u32(3).unwrap();
        assert_eq!(line.amount(), "59.97".parse::<Decimal>().unwrap());
    }

    #[test]
    fn checked_add_accumulates() {
        let total = Money::from(150_000)
            .checked_add(Money::from(850_000))
            .unwrap();
        assert_eq!(total, Money::from(1_000_000));
    }
}
