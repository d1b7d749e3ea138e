//! Monetary amounts.
//!
//! Amounts are exact decimals so that percentage-based fees (e.g. a 5%
//! platform fee) never accumulate rounding drift. Currency is implicit: one
//! marketplace, one currency.

use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// A monetary amount in the marketplace currency.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build from an amount in the smallest currency unit (e.g. cents).
    pub fn from_minor(units: i64) -> Self {
        Self(Decimal::new(units, 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Unit price × quantity.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Multiply by a rate (e.g. `0.05` for 5%). No rounding is applied.
    pub fn scale(self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// `max(0, self)`.
    pub fn floor_zero(self) -> Self {
        if self.is_negative() { Self::ZERO } else { self }
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("invalid amount '{s}': {e}")))?;
        Ok(Self(amount))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn times_multiplies_unit_price() {
        assert_eq!(Money::from_minor(1000).times(2), Money::from_minor(2000));
    }

    #[test]
    fn five_percent_of_twenty_is_one() {
        let fee = Money::from_minor(2000).scale(Decimal::new(5, 2));
        assert_eq!(fee, Money::from_minor(100));
    }

    #[test]
    fn floor_zero_clamps_negative_amounts() {
        let m = Money::from_minor(500) - Money::from_minor(700);
        assert!(m.is_negative());
        assert_eq!(m.floor_zero(), Money::ZERO);
        assert_eq!(Money::from_minor(1).floor_zero(), Money::from_minor(1));
    }

    #[test]
    fn parses_decimal_strings() {
        let m: Money = "19.99".parse().unwrap();
        assert_eq!(m, Money::from_minor(1999));
        assert!(matches!("abc".parse::<Money>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_minor(2050)).unwrap();
        assert_eq!(json, "\"20.50\"");
    }

    proptest! {
        #[test]
        fn sum_matches_fold(cents in prop::collection::vec(0i64..1_000_000, 0..20)) {
            let total: Money = cents.iter().map(|c| Money::from_minor(*c)).sum();
            let expected: i64 = cents.iter().sum();
            prop_assert_eq!(total, Money::from_minor(expected));
        }
    }
}
