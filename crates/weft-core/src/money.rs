//! # Money
//!
//! Amounts are whole cents in an `i64`. Prices are quoted per kilogram, so
//! the only rounding step in the ledger is `unit_price × kg`:
//!
//! ```text
//!   unit_price ($/kg) × kg ──round once──► line_total
//!   Σ line_total          ──────────────► shipment total
//!   Σ shipments − Σ payments ───────────► customer balance (may go negative)
//!   Σ billed costs − Σ supplier payments ► supplier balance
//! ```
//!
//! ```rust
//! use weft_core::money::Money;
//!
//! let total = Money::from_cents(1099) + Money::from_cents(500);
//! assert_eq!(total.to_string(), "$15.99");
//!
//! let parsed: Money = "1,250.5".parse().unwrap();
//! assert_eq!(parsed.cents(), 125050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::weight::Weight;

// =============================================================================
// Money Type
// =============================================================================

/// Signed amount in cents. Stored in document bodies as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// A prepaid customer or an overpaid supplier.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    fn whole_units(&self) -> u64 {
        (self.0 / 100).unsigned_abs()
    }

    fn fraction(&self) -> u64 {
        (self.0 % 100).unsigned_abs()
    }

    /// Prices a weight at this per-kilogram rate.
    ///
    /// ## Rounding
    /// `cents_per_kg × grams / 1000`, rounded half away from zero to the
    /// nearest cent. Computed in i128; `None` when the result does not fit
    /// in an i64 of cents.
    ///
    /// ## Example
    /// ```rust
    /// use weft_core::{Money, Weight};
    ///
    /// let per_kg = Money::from_cents(385);          // $3.85 / kg
    /// let kg = Weight::from_grams(12_345);           // 12.345 kg
    /// // 3.85 × 12.345 = 47.52825 → $47.53
    /// assert_eq!(per_kg.for_weight(kg).map(|m| m.cents()), Some(4753));
    /// ```
    pub fn for_weight(&self, weight: Weight) -> Option<Money> {
        let product = self.0 as i128 * weight.grams() as i128;
        let half = if product < 0 { -500 } else { 500 };
        i64::try_from((product + half) / 1000).ok().map(Money)
    }

    /// Average price per kilogram for an amount spread over a weight.
    ///
    /// Returns `None` when the weight is zero or the average does not fit
    /// in an i64 of cents.
    pub fn per_kg(&self, weight: Weight) -> Option<Money> {
        if weight.is_zero() {
            return None;
        }
        let scaled = self.0 as i128 * 1000;
        let grams = weight.grams() as i128;
        let half = grams / 2;
        let rounded = if scaled < 0 {
            (scaled - half) / grams
        } else {
            (scaled + half) / grams
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Formats with a custom currency symbol, e.g. `€1,234.56`.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!(
            "{}{}{}.{:02}",
            sign,
            symbol,
            group_thousands(self.whole_units()),
            self.fraction()
        )
    }
}

// =============================================================================
// Formatting & Parsing Helpers
// =============================================================================

/// Inserts `,` thousands separators into a non-negative integer.
pub(crate) fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Parses an unsigned decimal string into an integer scaled by `10^decimals`.
///
/// Accepts `,` and `_` as digit group separators. More fractional digits
/// than `decimals` is an error rather than a silent truncation.
pub(crate) fn parse_scaled(input: &str, decimals: u32) -> Result<i64, String> {
    let cleaned: String = input.chars().filter(|c| *c != ',' && *c != '_').collect();
    if cleaned.is_empty() {
        return Err("empty value".to_string());
    }

    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err("no digits".to_string());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{}' is not a decimal number", input));
    }
    if frac.len() > decimals as usize {
        return Err(format!("at most {} decimal places allowed", decimals));
    }

    let scale = 10_i64.pow(decimals);
    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| "value too large".to_string())?
    };
    let frac_value: i64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().map_err(|_| "value too large".to_string())?
    };

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| "value too large".to_string())
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display as `$1,234.56` (negative: `-$1,234.56`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("$"))
    }
}

/// Parses `12`, `12.5`, `$1,250.00` or `-3.10`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);

        let cents = parse_scaled(rest, 2)
            .map_err(|reason| ValidationError::invalid_format("amount", reason))?;

        Ok(Money(if negative { -cents } else { cents }))
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
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
