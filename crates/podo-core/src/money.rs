//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE SPLIT PROBLEM                                                      │
//! │                                                                         │
//! │  ₩10,001 at 30% shop / 70% owner in floating point:                    │
//! │    shop  = 3000.3  → 3000                                               │
//! │    owner = 7000.7  → 7001                                               │
//! │    Rounding each side independently can gain or lose one won.          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer won, one rounded side                            │
//! │    shop  = (10001 × 30 + 50) / 100 = 3000                              │
//! │    owner = 10001 − 3000            = 7001                              │
//! │    shop + owner == price, always                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use podo_core::money::Money;
//!
//! let price = Money::won(12_000);
//! let shop = price.percent(50);
//! assert_eq!((price - shop).amount(), 6_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (won has no minor unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: expected settlements can be negative when rent exceeds
///   the month's earnings
/// - **Single field tuple struct**: serialized as a bare integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from an amount in won.
    ///
    /// ## Example
    /// ```rust
    /// use podo_core::money::Money;
    ///
    /// let price = Money::won(15_000);
    /// assert_eq!(price.amount(), 15_000);
    /// ```
    #[inline]
    pub const fn won(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount in won.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
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

    /// Takes `rate_pct` percent of this amount, rounding half up.
    ///
    /// ## Implementation
    /// Integer math only: `(amount * rate + 50) / 100`.
    /// The +50 provides rounding (50/100 = 0.5). Amounts passed here are
    /// non-negative prices, so half-up and half-away-from-zero coincide.
    ///
    /// ## Example
    /// ```rust
    /// use podo_core::money::Money;
    ///
    /// assert_eq!(Money::won(10_001).percent(30).amount(), 3_000);
    /// assert_eq!(Money::won(8_000).percent(20).amount(), 1_600);
    /// // 0.5 rounds up
    /// assert_eq!(Money::won(15).percent(10).amount(), 2);
    /// ```
    pub fn percent(&self, rate_pct: u8) -> Money {
        // i128 so price × rate can never overflow
        let part = (self.0 as i128 * rate_pct as i128 + 50) / 100;
        Money(part as i64)
    }

    /// Subtracts `other`, flooring the result at zero.
    ///
    /// Returns the floored value and the part of `other` that could not be
    /// taken (the shortfall). A non-zero shortfall means the result is larger
    /// than a plain subtraction would give.
    ///
    /// ## Example
    /// ```rust
    /// use podo_core::money::Money;
    ///
    /// let (left, short) = Money::won(500).floor_sub(Money::won(800));
    /// assert_eq!(left, Money::zero());
    /// assert_eq!(short, Money::won(300));
    /// ```
    pub fn floor_sub(&self, other: Money) -> (Money, Money) {
        let raw = self.0 - other.0;
        if raw < 0 {
            (Money::zero(), Money(-raw))
        } else {
            (Money(raw), Money::zero())
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money the way receipts print it: `₩12,000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}₩{}", sign, grouped)
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
