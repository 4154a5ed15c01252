use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;
use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Print,
    Lamination,
    #[serde(rename = "income")]
    Payment,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Print => write!(f, "print"),
            EventKind::Lamination => write!(f, "lamination"),
            EventKind::Payment => write!(f, "income"),
        }
    }
}

/// The two billable job kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeKind {
    Print,
    Lamination,
}

impl From<ChargeKind> for EventKind {
    fn from(kind: ChargeKind) -> Self {
        match kind {
            ChargeKind::Print => EventKind::Print,
            ChargeKind::Lamination => EventKind::Lamination,
        }
    }
}

impl FromStr for ChargeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "print" => Ok(ChargeKind::Print),
            "lamination" => Ok(ChargeKind::Lamination),
            other => Err(format!("unknown charge kind '{other}' (use print or lamination)")),
        }
    }
}

/// An immutable billable fact recorded against one account.
///
/// `seq` is assigned by the store when the event is appended and records
/// insertion order; events built in memory start at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub seq: u64,
    pub kind: EventKind,
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: EventKind, amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self {
            seq: 0,
            kind,
            amount,
            timestamp,
        }
    }

    pub fn charge(kind: ChargeKind, amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self::new(kind.into(), amount, timestamp)
    }

    pub fn print(amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self::new(EventKind::Print, amount, timestamp)
    }

    pub fn lamination(amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self::new(EventKind::Lamination, amount, timestamp)
    }

    pub fn payment(amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self::new(EventKind::Payment, amount, timestamp)
    }

    pub fn is_payment(&self) -> bool {
        self.kind == EventKind::Payment
    }

    /// Reject amounts the ledger cannot take.
    pub fn validate(&self) -> Result<(), BillingError> {
        self.amount.ensure_amount().map(|_| ())
    }
}

/// Parse a CLI date: either `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, BillingError> {
    let t = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(t) {
        return Ok(ts.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| BillingError::InvalidDate(input.to_string()))
}
