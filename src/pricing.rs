//! Pricing
//!
//! Money arithmetic helpers shared by the cart and checkout. All arithmetic
//! goes through [`rust_decimal`] with explicit overflow handling; a
//! [`Money`] value never changes currency once constructed.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors that can occur during money arithmetic or conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Two money values with different currencies were combined.
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// ISO alpha code the operation expected.
        expected: &'static str,
        /// ISO alpha code it actually received.
        actual: &'static str,
    },

    /// A decimal operation overflowed or was not representable.
    #[error("money arithmetic overflowed")]
    Overflow,

    /// A raw amount could not be represented as money.
    #[error("amount {0} cannot be represented as money")]
    InvalidAmount(String),
}

/// Zero in the given currency.
pub fn zero(currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_minor(0, currency)
}

/// Check that `money` is denominated in `expected`.
///
/// # Errors
///
/// Returns [`PricingError::CurrencyMismatch`] when the currencies differ.
pub fn ensure_currency(
    expected: &'static Currency,
    money: &Money<'static, Currency>,
) -> Result<(), PricingError> {
    let actual = money.currency();
    if actual == expected {
        Ok(())
    } else {
        Err(PricingError::CurrencyMismatch {
            expected: expected.iso_alpha_code,
            actual: actual.iso_alpha_code,
        })
    }
}

/// Add two money values of the same currency.
///
/// # Errors
///
/// Returns an error on currency mismatch or decimal overflow.
pub fn add(
    a: &Money<'static, Currency>,
    b: &Money<'static, Currency>,
) -> Result<Money<'static, Currency>, PricingError> {
    ensure_currency(a.currency(), b)?;

    let sum = a
        .amount()
        .checked_add(*b.amount())
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_decimal(sum, a.currency()))
}

/// Multiply a unit price by a quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the product is not representable.
pub fn line_total(
    unit_price: &Money<'static, Currency>,
    quantity: u32,
) -> Result<Money<'static, Currency>, PricingError> {
    let total = unit_price
        .amount()
        .checked_mul(Decimal::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_decimal(total, unit_price.currency()))
}

/// Convert a money value to minor units (pence/cents).
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the scaled amount exceeds `i64`.
pub fn to_minor_units(money: &Money<'static, Currency>) -> Result<i64, PricingError> {
    let scale = 10u64
        .checked_pow(money.currency().exponent)
        .ok_or(PricingError::Overflow)?;

    let Some(scale) = Decimal::from_u64(scale) else {
        return Err(PricingError::Overflow);
    };

    let scaled = money
        .amount()
        .checked_mul(scale)
        .ok_or(PricingError::Overflow)?;

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}

/// Convert a raw wire amount (JSON number) into money, rounded to the
/// currency's minor unit.
///
/// # Errors
///
/// Returns [`PricingError::InvalidAmount`] for NaN, infinite or negative
/// amounts.
pub fn from_wire_amount(
    value: f64,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let Some(amount) = Decimal::from_f64_retain(value) else {
        return Err(PricingError::InvalidAmount(value.to_string()));
    };

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PricingError::InvalidAmount(value.to_string()));
    }

    let rounded = amount.round_dp_with_strategy(
        currency.exponent,
        RoundingStrategy::MidpointAwayFromZero,
    );

    Ok(Money::from_decimal(rounded, currency))
}

/// Convert a money value back to a wire amount (JSON number).
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the amount has no `f64`
/// representation.
pub fn to_wire_amount(money: &Money<'static, Currency>) -> Result<f64, PricingError> {
    money.amount().to_f64().ok_or(PricingError::Overflow)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn add_same_currency() -> TestResult {
        let a = Money::from_minor(100, iso::USD);
        let b = Money::from_minor(250, iso::USD);

        assert_eq!(add(&a, &b)?, Money::from_minor(350, iso::USD));

        Ok(())
    }

    #[test]
    fn add_currency_mismatch_errors() {
        let a = Money::from_minor(100, iso::USD);
        let b = Money::from_minor(100, iso::GBP);

        assert_eq!(
            add(&a, &b),
            Err(PricingError::CurrencyMismatch {
                expected: iso::USD.iso_alpha_code,
                actual: iso::GBP.iso_alpha_code,
            })
        );
    }

    #[test]
    fn line_total_multiplies_by_quantity() -> TestResult {
        let unit = Money::from_minor(4900, iso::USD);

        assert_eq!(line_total(&unit, 3)?, Money::from_minor(14700, iso::USD));

        Ok(())
    }

    #[test]
    fn line_total_zero_quantity_is_zero() -> TestResult {
        let unit = Money::from_minor(4900, iso::USD);

        assert_eq!(line_total(&unit, 0)?, zero(iso::USD));

        Ok(())
    }

    #[test]
    fn minor_units_round_trip() -> TestResult {
        let money = Money::from_minor(12345, iso::USD);

        assert_eq!(to_minor_units(&money)?, 12345);

        Ok(())
    }

    #[test]
    fn wire_amount_rounds_to_minor_unit() -> TestResult {
        let money = from_wire_amount(49.999, iso::USD)?;

        assert_eq!(to_minor_units(&money)?, 5000);

        Ok(())
    }

    #[test]
    fn wire_amount_rejects_nan_and_negative() {
        assert!(matches!(
            from_wire_amount(f64::NAN, iso::USD),
            Err(PricingError::InvalidAmount(_))
        ));
        assert!(matches!(
            from_wire_amount(-1.0, iso::USD),
            Err(PricingError::InvalidAmount(_))
        ));
    }

    #[test]
    fn wire_amount_round_trips() -> TestResult {
        let money = from_wire_amount(200.0, iso::USD)?;

        let wire = to_wire_amount(&money)?;
        assert!((wire - 200.0).abs() < f64::EPSILON, "wire amount drifted");

        Ok(())
    }
}
