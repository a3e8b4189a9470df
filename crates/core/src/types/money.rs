//! Money helpers using decimal arithmetic.
//!
//! All amounts are USD in major units (dollars, not cents) held as
//! [`Decimal`]. Rounding is always half-away-from-zero to two places.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round an amount to whole cents.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A display-ready price.
///
/// Serializes as a decimal string (`"12.50"`) so JSON clients never see
/// floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap an amount, rounding it to cents.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(round_cents(amount))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents_midpoint_goes_up() {
        assert_eq!(round_cents(Decimal::new(1_125, 3)), Decimal::new(113, 2));
        assert_eq!(round_cents(Decimal::new(1_124, 3)), Decimal::new(112, 2));
    }

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Price::new(Decimal::new(5, 0)).to_string(), "$5.00");
        assert_eq!(Price::new(Decimal::new(1999, 2)).to_string(), "$19.99");
    }
}
