//! # Weight Module
//!
//! Fabric is sold by the kilogram. `Weight` stores grams as an `i64` so that
//! lot arithmetic (decrement on shipment, restore on delete) is exact: a lot
//! restored after a shipment is deleted must compare equal to its original
//! value, which floating point kilograms cannot guarantee.
//!
//! ```rust
//! use weft_core::Weight;
//!
//! let lot: Weight = "250.5".parse().unwrap();
//! let shipped: Weight = "100.25 kg".parse().unwrap();
//! assert_eq!((lot - shipped).to_string(), "150.25 kg");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::{group_thousands, parse_scaled};

/// A weight in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Weight(i64);

impl Weight {
    /// Creates a weight from grams.
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    /// Creates a weight from whole kilograms.
    #[inline]
    pub const fn from_kg(kg: i64) -> Self {
        Weight(kg * 1000)
    }

    /// Returns the weight in grams.
    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Splits the weight evenly over `count` units (e.g. kg per roll),
    /// rounded half-up to the gram. Zero units yields zero.
    pub fn per_unit(&self, count: u32) -> Weight {
        if count == 0 {
            return Weight::zero();
        }
        let count = count as i64;
        Weight((self.0 + count / 2) / count)
    }
}

impl fmt::Display for Weight {
    /// Shows two decimals unless the value has gram precision,
    /// e.g. `1,200.50 kg` or `12.345 kg`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = group_thousands(abs / 1000);
        let grams = abs % 1000;
        if grams % 10 == 0 {
            write!(f, "{}{}.{:02} kg", sign, whole, grams / 10)
        } else {
            write!(f, "{}{}.{:03} kg", sign, whole, grams)
        }
    }
}

/// Parses kilograms with up to three decimals: `25`, `25.5`, `1,200.125 kg`.
impl FromStr for Weight {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_suffix("kg")
            .or_else(|| trimmed.strip_suffix("KG"))
            .unwrap_or(trimmed)
            .trim_end();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let grams = parse_scaled(rest, 3).map_err(|reason| ValidationError::invalid_format("kg", reason))?;
        Ok(Weight(if negative { -grams } else { grams }))
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight::zero()
    }
}

impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl AddAssign for Weight {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Weight {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Weight(self.0 - other.0)
    }
}

impl SubAssign for Weight {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Weight> for Weight {
    fn sum<I: Iterator<Item = &'a Weight>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Weight::from_grams(120_500).to_string(), "120.50 kg");
        assert_eq!(Weight::from_grams(12_345).to_string(), "12.345 kg");
        assert_eq!(Weight::from_kg(1_200).to_string(), "1,200.00 kg");
        assert_eq!(Weight::from_grams(-2_500).to_string(), "-2.50 kg");
        assert_eq!(Weight::zero().to_string(), "0.00 kg");
    }

    #[test]
    fn test_parse() {
        assert_eq!("25".parse::<Weight>().unwrap(), Weight::from_kg(25));
        assert_eq!("25.5".parse::<Weight>().unwrap().grams(), 25_500);
        assert_eq!("1,200.125 kg".parse::<Weight>().unwrap().grams(), 1_200_125);
        assert_eq!(" 7kg ".parse::<Weight>().unwrap().grams(), 7_000);

        assert!("".parse::<Weight>().is_err());
        assert!("ten".parse::<Weight>().is_err());
        assert!("1.2345".parse::<Weight>().is_err());
    }

    #[test]
    fn test_per_unit() {
        // 250 kg over 12 rolls = 20.8333 → 20.833 kg
        assert_eq!(Weight::from_kg(250).per_unit(12).grams(), 20_833);
        assert_eq!(Weight::from_kg(100).per_unit(4), Weight::from_kg(25));
        assert_eq!(Weight::from_kg(100).per_unit(0), Weight::zero());
    }

    #[test]
    fn test_arithmetic() {
        let total = Weight::from_kg(100);
        let mut remaining = total;
        remaining -= Weight::from_grams(40_250);
        assert_eq!(remaining.grams(), 59_750);
        remaining += Weight::from_grams(40_250);
        assert_eq!(remaining, total);

        let sum: Weight = [Weight::from_kg(1), Weight::from_kg(2)].iter().sum();
        assert_eq!(sum, Weight::from_kg(3));
    }
}
