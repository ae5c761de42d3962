//! Fixed-point currency amounts.
//!
//! Amounts are stored as a whole number of cents so that balances can be
//! adjusted exactly, both in Rust and in SQL (`balance = balance + ?1`).

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// An amount of money in cents.
///
/// Serialized as a decimal string, e.g. `"12.50"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(i64);

impl Money {
    /// Zero dollars and zero cents.
    pub const ZERO: Money = Money(0);

    /// The largest amount that can be recorded, 99999999.99.
    ///
    /// Balances are sums of many amounts and must stay within an SQLite integer.
    pub const MAX: Money = Money(9_999_999_999);

    /// Create an amount from a number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount as a number of cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Check that the amount is no larger than [Money::MAX] in either direction.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountTooLarge] if the amount is out of bounds.
    pub fn ensure_within_limit(self) -> Result<Self, Error> {
        if self.0.unsigned_abs() <= Self::MAX.0.unsigned_abs() {
            Ok(self)
        } else {
            Err(Error::AmountTooLarge(self))
        }
    }

    /// Parse an amount such as `"12"`, `"12.5"`, `"-12.50"` or `"$12.50"`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `text` is not a number with at most
    /// two decimal places, or [Error::AmountTooLarge] if it is larger than
    /// [Money::MAX].
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidAmount(text.to_owned());
        let trimmed = text.trim();

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let unsigned = unsigned.strip_prefix('$').unwrap_or(unsigned);

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || fraction.len() > 2
        {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or_else(invalid)?;

        Self(if negative { -cents } else { cents }).ensure_within_limit()
    }

    /// The ratio `self / other` as a percentage, or `None` if `other` is zero.
    pub fn percentage_of(&self, other: Money) -> Option<f64> {
        if other.0 == 0 {
            None
        } else {
            Some(self.0 as f64 / other.0 as f64 * 100.0)
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();

        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl TryFrom<String> for Money {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Money::parse(&value)
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |total, amount| total + amount)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::Money;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(Money::parse("10"), Ok(Money::from_cents(1000)));
        assert_eq!(Money::parse("10.5"), Ok(Money::from_cents(1050)));
        assert_eq!(Money::parse("10.05"), Ok(Money::from_cents(1005)));
        assert_eq!(Money::parse("$10.50"), Ok(Money::from_cents(1050)));
        assert_eq!(Money::parse(" -0.50 "), Ok(Money::from_cents(-50)));
        assert_eq!(Money::parse(".75"), Ok(Money::from_cents(75)));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for text in ["", "-", ".", "abc", "1.234", "1.2.3", "1,50", "--1"] {
            assert_eq!(
                Money::parse(text),
                Err(Error::InvalidAmount(text.to_owned())),
                "expected {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_amounts_above_maximum() {
        assert_eq!(Money::parse("99999999.99"), Ok(Money::MAX));
        assert_eq!(Money::parse("-99999999.99"), Ok(-Money::MAX));
        assert_eq!(
            Money::parse("100000000"),
            Err(Error::AmountTooLarge(Money::from_cents(10_000_000_000)))
        );
        assert_eq!(
            Money::parse("90000000000000000.00"),
            Err(Error::AmountTooLarge(Money::from_cents(9_000_000_000_000_000_000)))
        );
        assert!(serde_json::from_str::<Money>("\"123456789\"").is_err());
    }

    #[test]
    fn displays_with_two_decimal_places() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(-1234)).unwrap();
        assert_eq!(json, "\"-12.34\"");

        let money: Money = serde_json::from_str("\"99.9\"").unwrap();
        assert_eq!(money, Money::from_cents(9990));
    }

    #[test]
    fn sums_amounts() {
        let total: Money = [100, 250, -50].into_iter().map(Money::from_cents).sum();

        assert_eq!(total, Money::from_cents(300));
    }

    #[test]
    fn percentage_of_zero_is_none() {
        assert_eq!(Money::from_cents(10).percentage_of(Money::ZERO), None);
        assert_eq!(
            Money::from_cents(50).percentage_of(Money::from_cents(200)),
            Some(25.0)
        );
    }
}
