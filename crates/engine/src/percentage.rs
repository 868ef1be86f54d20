//! Percentages with two decimal digits, stored as basis points.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::{EngineError, MoneyCents, ResultEngine, money::parse_hundredths};

/// A percentage stored as an integer number of basis points (hundredths of a
/// percent), so `12.5%` is `1250`.
///
/// ```rust
/// use engine::{MoneyCents, Percentage};
///
/// let ten: Percentage = "10".parse().unwrap();
/// assert_eq!(ten.basis_points(), 1000);
/// assert_eq!(ten.of(MoneyCents::new(100_00)).unwrap(), MoneyCents::new(10_00));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Percentage(i64);

impl Percentage {
    #[must_use]
    pub const fn from_basis_points(bp: i64) -> Self {
        Self(bp)
    }

    #[must_use]
    pub const fn basis_points(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns `amount * self / 100`, rounded half away from zero to the cent.
    pub fn of(self, amount: MoneyCents) -> ResultEngine<MoneyCents> {
        let product = i128::from(amount.cents()) * i128::from(self.0);
        let quotient = product / 10_000;
        let remainder = product % 10_000;
        let rounded = if remainder.abs() * 2 >= 10_000 {
            quotient + product.signum()
        } else {
            quotient
        };
        i64::try_from(rounded)
            .map(MoneyCents::new)
            .map_err(|_| EngineError::Validation("commission amount too large".to_string()))
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Percentage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s, "percentage").map(Percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_percent_of_hundred() {
        let pct: Percentage = "10".parse().unwrap();
        assert_eq!(pct.of(MoneyCents::new(10_000)).unwrap().cents(), 1_000);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 12.5% of 0.05 = 0.00625 -> 0.01
        let pct = Percentage::from_basis_points(1_250);
        assert_eq!(pct.of(MoneyCents::new(5)).unwrap().cents(), 1);
        // 12.5% of 0.03 = 0.00375 -> 0.00
        assert_eq!(pct.of(MoneyCents::new(3)).unwrap().cents(), 0);
        assert_eq!(pct.of(MoneyCents::new(-5)).unwrap().cents(), -1);
    }

    #[test]
    fn parses_fractional_percentages() {
        assert_eq!("7.5".parse::<Percentage>().unwrap().basis_points(), 750);
        assert_eq!("0,25".parse::<Percentage>().unwrap().basis_points(), 25);
        assert!("1.234".parse::<Percentage>().is_err());
        assert_eq!(Percentage::from_basis_points(750).to_string(), "7.50");
    }
}
