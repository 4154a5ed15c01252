use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::BillingError;

/// A monetary amount held as a whole number of cents.
///
/// Every ledger operation works on cents, so each addition or subtraction
/// is already rounded to two decimal places and repeated small payments
/// cannot drift. Values coming from text or `f64` are rounded half away
/// from zero at the cent.
///
/// ```
/// use printbill::Money;
///
/// let amount: Money = "12.345".parse().unwrap();
/// assert_eq!(amount.cents(), 1235);
/// assert_eq!(amount.to_string(), "12.35");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount a single charge or payment may carry. Keeps running
    /// totals far from `i64` overflow and exact through the `f64` form
    /// used in ledger.toml.
    pub const MAX_AMOUNT: Money = Money(100_000_000_000);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Convert a float amount, rejecting NaN and infinities.
    pub fn from_f64(value: f64) -> Result<Self, BillingError> {
        if !value.is_finite() {
            return Err(BillingError::InvalidMoney(value.to_string()));
        }
        Decimal::from_f64(value)
            .and_then(Self::from_decimal)
            .ok_or_else(|| BillingError::InvalidMoney(value.to_string()))
    }

    fn from_decimal(value: Decimal) -> Option<Self> {
        value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Money)
    }

    /// Accept `self` as an event amount: zero up to `MAX_AMOUNT`.
    pub fn ensure_amount(self) -> Result<Self, BillingError> {
        if self.is_negative() || self > Money::MAX_AMOUNT {
            return Err(BillingError::InvalidAmount(self.to_string()));
        }
        Ok(self)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiply by `factor`, rounding the result to the cent.
    pub fn scale(self, factor: f64) -> Money {
        Money((self.0 as f64 * factor).round() as i64)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn to_string_2dp(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() {
            return Err(BillingError::InvalidMoney(s.to_string()));
        }
        Decimal::from_str(t)
            .ok()
            .and_then(Money::from_decimal)
            .ok_or_else(|| BillingError::InvalidMoney(s.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_2dp())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_f64(value).map_err(serde::de::Error::custom)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}
