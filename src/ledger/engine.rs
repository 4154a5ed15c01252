//! Debt/credit reconciliation.
//!
//! Replays an account's events in timestamp order and derives its print
//! debt, lamination debt and net total, together with how much of the
//! replayed payments lands in each bank total.
//!
//! Rules applied per event:
//!
//! * a charge consumes available credit first; only the remainder becomes
//!   print or lamination debt;
//! * a payment settles lamination debt, then print debt; whatever is left
//!   becomes credit and is also counted in the print bank.
//!
//! Events with identical timestamps keep the order they were supplied in.

use serde::Serialize;

use crate::ledger::event::{Event, EventKind};
use crate::money::Money;

/// Debt figures persisted on an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub print_debt: Money,
    pub lamination_debt: Money,
    /// Negative when the account holds credit.
    pub total_debt: Money,
}

impl Balances {
    /// Credit implied by a negative total.
    pub fn credit(&self) -> Money {
        if self.total_debt.is_negative() {
            -self.total_debt
        } else {
            Money::ZERO
        }
    }
}

/// Payment money attributed to each bank total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BankIncrement {
    pub print_bank: Money,
    pub lamination_bank: Money,
}

impl BankIncrement {
    pub fn total(&self) -> Money {
        self.print_bank + self.lamination_bank
    }

    /// What was added on top of `earlier`.
    pub fn since(&self, earlier: &BankIncrement) -> BankIncrement {
        BankIncrement {
            print_bank: self.print_bank - earlier.print_bank,
            lamination_bank: self.lamination_bank - earlier.lamination_bank,
        }
    }
}

/// Result of replaying a full history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub balances: Balances,
    pub bank: BankIncrement,
    pub credit: Money,
}

/// Running replay state. Apply events one at a time in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
    print_debt: Money,
    lamination_debt: Money,
    credit: Money,
    print_bank: Money,
    lamination_bank: Money,
}

impl Replay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from persisted balances. Bank counters start at zero, so
    /// `bank()` afterwards reports only what later events contribute.
    ///
    /// Exact as long as the balances came from this engine: credit only
    /// exists once both debts are cleared, so the total alone recovers it.
    pub fn from_balances(balances: &Balances) -> Self {
        Self {
            print_debt: balances.print_debt,
            lamination_debt: balances.lamination_debt,
            credit: balances.credit(),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, event: &Event) {
        match event.kind {
            EventKind::Print => {
                let remainder = self.absorb(event.amount);
                self.print_debt += remainder;
            }
            EventKind::Lamination => {
                let remainder = self.absorb(event.amount);
                self.lamination_debt += remainder;
            }
            EventKind::Payment => self.pay(event.amount),
        }
    }

    /// Take a charge out of credit, returning what credit could not cover.
    fn absorb(&mut self, amount: Money) -> Money {
        let consumed = amount.min(self.credit);
        self.credit -= consumed;
        amount - consumed
    }

    fn pay(&mut self, amount: Money) {
        let mut remaining = amount;

        let pay_lamination = remaining.min(self.lamination_debt);
        self.lamination_debt -= pay_lamination;
        self.lamination_bank += pay_lamination;
        remaining -= pay_lamination;

        let pay_print = remaining.min(self.print_debt);
        self.print_debt -= pay_print;
        self.print_bank += pay_print;
        remaining -= pay_print;

        if remaining.is_positive() {
            // Overpayment is held as credit and still booked as print income.
            self.credit += remaining;
            self.print_bank += remaining;
        }
    }

    pub fn credit(&self) -> Money {
        self.credit
    }

    pub fn balances(&self) -> Balances {
        Balances {
            print_debt: self.print_debt,
            lamination_debt: self.lamination_debt,
            total_debt: self.print_debt + self.lamination_debt - self.credit,
        }
    }

    pub fn bank(&self) -> BankIncrement {
        BankIncrement {
            print_bank: self.print_bank,
            lamination_bank: self.lamination_bank,
        }
    }

    pub fn finish(&self) -> Reconciliation {
        Reconciliation {
            balances: self.balances(),
            bank: self.bank(),
            credit: self.credit,
        }
    }
}

/// Events in replay order: ascending timestamp, ties in input order.
pub fn chronological(events: &[Event]) -> Vec<&Event> {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);
    ordered
}

/// Replay a whole history from zero.
pub fn reconcile(events: &[Event]) -> Reconciliation {
    let mut replay = Replay::new();
    for event in chronological(events) {
        replay.apply(event);
    }
    replay.finish()
}

/// Bank contribution of `events[index]` at its place in the replay.
///
/// Payments recorded late are booked by what they settle at their own
/// timestamp; allocations of later payments are left as they were.
pub fn contribution(events: &[Event], index: usize) -> BankIncrement {
    let Some(target) = events.get(index) else {
        return BankIncrement::default();
    };
    let mut replay = Replay::new();
    for event in chronological(events) {
        let before = replay.bank();
        replay.apply(event);
        if std::ptr::eq(event, target) {
            return replay.bank().since(&before);
        }
    }
    BankIncrement::default()
}
