//! # Quantity Module
//!
//! Fixed-point quantities for stock levels and line items.
//!
//! Products are sold by the unit, but also by the meter, the kilo or the
//! hour, so quantities may be fractional. They are stored as thousandths in
//! an `i64`: `adjust(code, -q)` followed by `adjust(code, +q)` must give back
//! exactly the stock we started with, which floats cannot promise.
//!
//! ```text
//!   "2.5"  ──parse──►  Quantity(2500)  ──display──►  "2.50"
//!   "10"   ──parse──►  Quantity(10000)
//!   "0.0005"  ✗ more than three decimals
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{div_round, parse_fixed};

/// A quantity in thousandths of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Number of stored sub-units per whole unit.
    pub const SCALE: i64 = 1000;

    /// Creates a quantity from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * Self::SCALE)
    }

    /// Creates a quantity from thousandths.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Parses `"3"`, `"2.5"` or `"0.125"`.
    ///
    /// ## Example
    /// ```rust
    /// use cotiza_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::parse("2.5").unwrap().milli(), 2500);
    /// assert!(Quantity::parse("1.2345").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let milli = parse_fixed(input.trim(), 3).ok_or_else(|| {
            ValidationError::invalid_format("quantity", format!("'{}' is not a valid quantity", input.trim()))
        })?;
        Ok(Quantity(milli))
    }

    /// Zero quantity.
    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    /// Raw thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Formats with a fixed number of decimals (0 to 3), rounding half away
    /// from zero.
    pub fn format_decimals(&self, places: u32) -> String {
        let places = places.min(3);
        let divisor = 10_i128.pow(3 - places);
        let scaled = div_round(self.0 as i128, divisor);
        if places == 0 {
            return scaled.to_string();
        }
        let unit = 10_i128.pow(places);
        let sign = if scaled < 0 { "-" } else { "" };
        let abs = scaled.abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / unit,
            abs % unit,
            width = places as usize
        )
    }
}

/// Displays with two decimals, the way quantities are printed on documents.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimals(2))
    }
}

/// Saturates at the `i64` bounds. [`Quantity::checked_add`] reports the overflow instead.
impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0.saturating_add(other.0))
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0.saturating_sub(other.0))
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(self.0.saturating_neg())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
