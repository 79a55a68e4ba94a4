//! Exact money arithmetic
//!
//! Amounts are `Decimal` values with at most two fractional digits. The
//! stores persist them as integer minor units (cents).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::result::{Error, Result};

/// Number of fractional digits in one minor unit
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Check that an amount can be moved: strictly positive, whole cents
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_amount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    to_minor_units(amount)?;
    Ok(amount)
}

/// Convert to integer minor units, rejecting fractional cents
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| Error::invalid_amount(format!("{} is out of range", amount)))?;
    if !scaled.fract().is_zero() {
        return Err(Error::invalid_amount(format!(
            "{} has more than {} fractional digits",
            amount, MINOR_UNIT_SCALE
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| Error::invalid_amount(format!("{} is out of range", amount)))
}

/// Convert integer minor units back to a decimal amount
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Add two amounts, failing instead of overflowing
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| Error::invalid_amount(format!("{} + {} overflows", a, b)))
}

/// Subtract two amounts, failing instead of overflowing
pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| Error::invalid_amount(format!("{} - {} overflows", a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(to_minor_units(Decimal::new(3050, 2)).unwrap(), 3050);
        assert_eq!(to_minor_units(Decimal::new(30, 0)).unwrap(), 3000);
        assert_eq!(from_minor_units(3050), Decimal::new(3050, 2));
    }

    #[test]
    fn test_fractional_cents_rejected() {
        let err = to_minor_units(Decimal::new(1005, 3)).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
    }

    #[test]
    fn test_huge_amounts_are_out_of_range() {
        assert!(matches!(
            to_minor_units(Decimal::MAX),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_amount(Decimal::MAX),
            Err(Error::InvalidAmount(_))
        ));
        // Scales without overflow but does not fit in i64 cents
        assert!(matches!(
            validate_amount(Decimal::from_i128_with_scale(79228162514264337593543950, 0)),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-1, 2)).is_err());
        assert!(validate_amount(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn test_repeated_cents_do_not_drift() {
        // 0.10 added ten times is exactly 1.00
        let mut total = Decimal::ZERO;
        for _ in 0..10 {
            total = checked_add(total, Decimal::new(10, 2)).unwrap();
        }
        assert_eq!(total, Decimal::ONE);
        assert_eq!(to_minor_units(total).unwrap(), 100);
    }
}
