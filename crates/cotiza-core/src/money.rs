//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    25.50 × 3 × 1.16 computed in f64 = 88.74000000000001                │
//! │                                                                         │
//! │  Invoice totals are compared, summed into reports and printed.         │
//! │  A float drift of one ULP eventually shows up as a cent.               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    2550 cents × 3 = 7650 cents                                          │
//! │    tax = round(7650 × 1600 bps / 10000) = 1224 cents                   │
//! │    total = 8874 cents → "88.74"                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cotiza_core::money::Money;
//!
//! let price = Money::from_cents(85000); // 850.00
//! let parsed = Money::parse("850.00").unwrap();
//! assert_eq!(price, parsed);
//! assert_eq!(price.to_decimal_string(), "850.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::quantity::Quantity;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// Product.unit_price ──► LineItem snapshot ──► line_subtotal (× quantity)
///                                                   │
///                      Σ line_subtotal = subtotal ◄─┘
///                                │
///                                ├──► tax (× TaxRate, rounded to the cent)
///                                ▼
///                              total ──► reports, text and PDF output
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Money;
    ///
    /// let price = Money::from_cents(2550); // 25.50
    /// assert_eq!(price.cents(), 2550);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal amount such as `"850"`, `"25.5"` or `"12.00"`.
    ///
    /// At most two decimal places are accepted; anything else is a
    /// validation error rather than a silent rounding.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Money;
    ///
    /// assert_eq!(Money::parse("25.5").unwrap().cents(), 2550);
    /// assert!(Money::parse("1.999").is_err());
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cents = parse_fixed(input.trim(), 2)
            .ok_or_else(|| ValidationError::invalid_format("amount", format!("'{}' is not a valid amount", input.trim())))?;
        Ok(Money(cents))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax, rounding half away from zero to the cent.
    ///
    /// ## Implementation
    /// Integer math on i128: `cents × bps / 10000`, rounded, then clamped
    /// to the `i64` range. See [`Money::checked_tax`].
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Money;
    /// use cotiza_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(85000);
    /// let tax = subtotal.calculate_tax(TaxRate::from_percentage(16.0));
    /// assert_eq!(tax.cents(), 13600);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(saturate(self.tax_cents(rate)))
    }

    /// Tax at `rate`, or `None` when it does not fit in `i64` cents.
    pub fn checked_tax(&self, rate: TaxRate) -> Option<Money> {
        i64::try_from(self.tax_cents(rate)).ok().map(Money)
    }

    fn tax_cents(&self, rate: TaxRate) -> i128 {
        div_round(self.0 as i128 * rate.bps() as i128, 10_000)
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::money::Money;
    /// use cotiza_core::quantity::Quantity;
    ///
    /// let unit_price = Money::from_cents(1200); // 12.00 per meter
    /// let line = unit_price.multiply_quantity(Quantity::parse("2.5").unwrap());
    /// assert_eq!(line.cents(), 3000);
    /// ```
    ///
    /// Results beyond the `i64` range are clamped to it. Stored documents
    /// are checked with [`Money::checked_multiply_quantity`] before they are
    /// built, so clamping never shows up on a saved document.
    pub fn multiply_quantity(&self, qty: Quantity) -> Money {
        Money(saturate(self.line_cents(qty)))
    }

    /// Price × quantity, or `None` when the result does not fit in `i64` cents.
    ///
    /// ```rust
    /// use cotiza_core::money::Money;
    /// use cotiza_core::quantity::Quantity;
    ///
    /// let price = Money::from_cents(85000);
    /// assert!(price.checked_multiply_quantity(Quantity::from_units(3)).is_some());
    /// assert!(price.checked_multiply_quantity(Quantity::from_milli(i64::MAX)).is_none());
    /// ```
    pub fn checked_multiply_quantity(&self, qty: Quantity) -> Option<Money> {
        i64::try_from(self.line_cents(qty)).ok().map(Money)
    }

    fn line_cents(&self, qty: Quantity) -> i128 {
        div_round(self.0 as i128 * qty.milli() as i128, Quantity::SCALE as i128)
    }

    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Sum of `amounts`, or `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts.into_iter().try_fold(Money::zero(), Money::checked_add)
    }

    /// Formats as a plain decimal with two places, without currency symbol.
    ///
    /// Used by the renderers, which place the symbol themselves.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

fn saturate(cents: i128) -> i64 {
    cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Integer division rounding half away from zero.
pub(crate) fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

/// Parses a signed decimal string into an integer scaled by `10^places`.
///
/// Returns `None` for empty input, stray characters, or more fractional
/// digits than `places`.
pub(crate) fn parse_fixed(input: &str, places: u32) -> Option<i64> {
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if fraction.len() > places as usize {
        return None;
    }

    let scale = 10_i64.pow(places);
    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut fraction_value: i64 = if fraction.is_empty() { 0 } else { fraction.parse().ok()? };
    for _ in fraction.len()..places as usize {
        fraction_value *= 10;
    }

    let value = whole_value.checked_mul(scale)?.checked_add(fraction_value)?;
    Some(if negative { -value } else { value })
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// The operators saturate instead of wrapping. Use the `checked_*` methods
// where an overflow has to become an error.

/// Display shows the amount with a `$` prefix, e.g. `$2550.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
