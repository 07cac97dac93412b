//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The cash drawer runs on soles and céntimos. In floating point:         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A close that splits S/ 20.00 across cash, Yape, Plin and debt must     │
//! │  balance to the céntimo. Floats drift; drawers don't.                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Céntimos                                         │
//! │    S/ 10.50 is stored as 1050. All arithmetic is exact.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cabina_core::money::Money;
//!
//! let price = Money::from_cents(1050); // S/ 10.50
//! let line = price * 3i64;             // S/ 31.50
//! assert_eq!(line.cents(), 3150);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in céntimos (hundredths of a sol).
///
/// ## Design Decisions
/// - **i64 (signed)**: room for corrections and drawer shortfalls
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Display as `S/ 10.50`**: debugging convenience; the UI does its own
///   localized formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from céntimos.
    ///
    /// ## Example
    /// ```rust
    /// use cabina_core::money::Money;
    ///
    /// let price = Money::from_cents(1050); // S/ 10.50
    /// assert_eq!(price.cents(), 1050);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole soles and céntimos.
    ///
    /// For negative amounts, only the soles part should carry the sign:
    /// `from_soles(-5, 50)` is -S/ 5.50.
    #[inline]
    pub const fn from_soles(soles: i64, cents: i64) -> Self {
        if soles < 0 {
            Money(soles * 100 - cents)
        } else {
            Money(soles * 100 + cents)
        }
    }

    /// Returns the value in céntimos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-soles portion.
    #[inline]
    pub const fn soles(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the céntimos portion (always 0-99).
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a line quantity.
    ///
    /// ## Example
    /// ```rust
    /// use cabina_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(250); // S/ 2.50
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 750); // S/ 7.50
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Subtraction clamped at zero: how much of `self` remains uncovered
    /// after `other` is applied.
    ///
    /// This is the shape of every "what is still owed" computation in the
    /// billing code.
    ///
    /// ## Example
    /// ```rust
    /// use cabina_core::money::Money;
    ///
    /// let owed = Money::from_cents(2000);
    /// let paid = Money::from_cents(1500);
    /// assert_eq!(owed.shortfall_after(paid).cents(), 500);
    /// assert_eq!(paid.shortfall_after(owed).cents(), 0); // overpaid, no shortfall
    /// ```
    #[inline]
    pub const fn shortfall_after(&self, other: Money) -> Self {
        let diff = self.0 - other.0;
        if diff > 0 {
            Money(diff)
        } else {
            Money(0)
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money in `S/ 10.50` format. Debugging only; the UI
/// formats for locale itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}S/ {}.{:02}", sign, self.soles().abs(), self.cents_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing an iterator of Money values (ledger totals).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
