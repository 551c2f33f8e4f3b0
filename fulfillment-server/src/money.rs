//! Money arithmetic
//!
//! All amounts are `rust_decimal::Decimal`. Totals are rounded to two
//! decimal places, half away from zero, only at presentation boundaries
//! (bill lines and settlement totals); intermediate sums keep full
//! precision.

use rust_decimal::{Decimal, RoundingStrategy};

pub const DECIMAL_PLACES: u32 = 2;

/// Round a money amount to cents, half away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec("10.005")), dec("10.01"));
        assert_eq!(round_money(dec("10.004")), dec("10.00"));
        assert_eq!(round_money(dec("-10.005")), dec("-10.01"));
    }

    #[test]
    fn no_float_drift_on_repeated_addition() {
        // 0.1 + 0.2 style sums stay exact in Decimal
        let total: Decimal = std::iter::repeat(dec("0.10")).take(3).sum();
        assert_eq!(total, dec("0.30"));
    }
}
