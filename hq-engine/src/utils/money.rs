//! Money calculation utilities using rust_decimal for precision
//!
//! Records carry amounts as `f64`, exactly as the backing service stores
//! them. All aggregation happens in `Decimal`, converted back to `f64`
//! rounded to 2 decimal places.
//!
//! Arithmetic saturates at the `Decimal` bounds instead of panicking.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
///
/// Non-finite input converts to zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Sum a sequence of amounts without floating-point drift
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .map(to_decimal)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Accumulate an amount into a running total
#[inline]
pub fn accumulate(total: &mut Decimal, value: f64) {
    *total = total.saturating_add(to_decimal(value));
}

/// `a - b`, saturating at the bounds
#[inline]
pub fn difference(a: Decimal, b: Decimal) -> Decimal {
    a.saturating_sub(b)
}

/// Line total: unit price times quantity
#[inline]
pub fn line_total(price: f64, qty: i64) -> Decimal {
    to_decimal(price).saturating_mul(Decimal::from(qty))
}

/// Whether two amounts are equal within [`MONEY_TOLERANCE`]
pub fn approx_eq(a: f64, b: f64) -> bool {
    difference(to_decimal(a), to_decimal(b)).abs() < MONEY_TOLERANCE
}
