use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;
use crate::ledger::engine::{reconcile, Balances, BankIncrement, Reconciliation};
use crate::ledger::event::Event;
use crate::money::Money;

/// The four kinds of billable account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Individual,
    Team,
    Unit,
    Sector,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Individual,
        Category::Team,
        Category::Unit,
        Category::Sector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Individual => "individual",
            Category::Team => "team",
            Category::Unit => "unit",
            Category::Sector => "sector",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| BillingError::InvalidCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub print_debt: Money,
    #[serde(default)]
    pub lamination_debt: Money,
    #[serde(default)]
    pub total_debt: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_payment: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            print_debt: Money::ZERO,
            lamination_debt: Money::ZERO,
            total_debt: Money::ZERO,
            last_payment: None,
            created_at,
        }
    }

    pub fn balances(&self) -> Balances {
        Balances {
            print_debt: self.print_debt,
            lamination_debt: self.lamination_debt,
            total_debt: self.total_debt,
        }
    }

    pub fn set_balances(&mut self, balances: &Balances) {
        self.print_debt = balances.print_debt;
        self.lamination_debt = balances.lamination_debt;
        self.total_debt = balances.total_debt;
    }

    /// Overwrite balances and last payment from a full replay of `history`.
    pub fn rebuild(&mut self, history: &[Event]) -> Reconciliation {
        let result = reconcile(history);
        self.set_balances(&result.balances);
        self.last_payment = history
            .iter()
            .filter(|e| e.is_payment())
            .map(|e| e.timestamp)
            .max();
        result
    }
}

/// Which bank totals an administrative reset zeroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankScope {
    Print,
    Lamination,
    All,
}

impl FromStr for BankScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "print" => Ok(BankScope::Print),
            "lamination" => Ok(BankScope::Lamination),
            "all" => Ok(BankScope::All),
            other => Err(format!("unknown bank scope '{other}' (use print, lamination or all)")),
        }
    }
}

/// Money collected across every account, split by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(default)]
    pub print_bank: Money,
    #[serde(default)]
    pub lamination_bank: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Bank {
    pub fn apply(&mut self, increment: &BankIncrement, at: DateTime<Utc>) {
        self.print_bank += increment.print_bank;
        self.lamination_bank += increment.lamination_bank;
        self.last_updated = Some(at);
    }

    pub fn reset(&mut self, scope: BankScope, at: DateTime<Utc>) {
        if matches!(scope, BankScope::Print | BankScope::All) {
            self.print_bank = Money::ZERO;
        }
        if matches!(scope, BankScope::Lamination | BankScope::All) {
            self.lamination_bank = Money::ZERO;
        }
        self.last_updated = Some(at);
    }

    pub fn total(&self) -> Money {
        self.print_bank + self.lamination_bank
    }
}
