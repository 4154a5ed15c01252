use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{BillingError, Result};
use crate::ledger::{
    chronological, contribution, reconcile, Account, Bank, BankIncrement, BankScope, Category,
    ChargeKind, Event, EventKind, Replay,
};
use crate::money::Money;
use crate::store::LedgerStore;

/// Outcome of recording a payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub account: Account,
    /// What this payment added to the bank aggregate.
    pub increment: BankIncrement,
    pub bank: Bank,
}

/// Records charges and payments against a store and keeps the derived
/// balances and bank totals current.
///
/// This is where amounts are validated and unknown accounts rejected; the
/// ledger engine itself trusts its input.
#[derive(Debug)]
pub struct Billing<S> {
    store: S,
}

impl<S: LedgerStore> Billing<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn open_account(&self, id: &str, name: &str, category: Category) -> Result<Account> {
        let account = Account::new(id, name, category, Utc::now());
        self.store.create_account(account.clone())?;
        info!(account = id, %category, "opened account");
        Ok(account)
    }

    pub fn account(&self, id: &str) -> Result<Account> {
        self.store
            .account(id)?
            .ok_or_else(|| BillingError::AccountNotFound(id.to_string()))
    }

    /// All accounts ordered by id.
    pub fn accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = self.store.accounts()?;
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(accounts)
    }

    /// The account's events in replay order.
    pub fn history(&self, id: &str) -> Result<Vec<Event>> {
        self.account(id)?;
        let events = self.store.events(id)?;
        Ok(chronological(&events).into_iter().cloned().collect())
    }

    /// Record a print or lamination job.
    ///
    /// A charge dated at or after everything already on the account is
    /// applied to the persisted balances directly; a backdated charge
    /// triggers a full replay instead.
    pub fn record_charge(
        &self,
        account_id: &str,
        kind: ChargeKind,
        amount: Money,
        at: DateTime<Utc>,
    ) -> Result<Account> {
        let event = Event::charge(kind, amount, at);
        event.validate()?;

        let account = self
            .store
            .append_event(account_id, event, &mut |account, history| {
                let Some((new, earlier)) = history.split_last() else {
                    return;
                };
                if earlier.iter().all(|e| e.timestamp <= new.timestamp) {
                    let mut replay = Replay::from_balances(&account.balances());
                    replay.apply(new);
                    account.set_balances(&replay.balances());
                } else {
                    debug!(account = %account.id, "backdated charge, replaying history");
                    account.rebuild(history);
                }
            })?;

        info!(
            account = account_id,
            kind = %EventKind::from(kind),
            %amount,
            total_debt = %account.total_debt,
            "recorded charge"
        );
        Ok(account)
    }

    /// Record a payment, update the account and add its allocation to the
    /// bank aggregate.
    pub fn record_payment(
        &self,
        account_id: &str,
        amount: Money,
        at: DateTime<Utc>,
    ) -> Result<PaymentReceipt> {
        let event = Event::payment(amount, at);
        event.validate()?;

        let mut increment = BankIncrement::default();
        let account = self
            .store
            .append_event(account_id, event, &mut |account, history| {
                increment = contribution(history, history.len().saturating_sub(1));
                account.rebuild(history);
            })?;

        let bank = self.store.increment_bank(&increment, Utc::now())?;
        info!(
            account = account_id,
            %amount,
            print_bank = %increment.print_bank,
            lamination_bank = %increment.lamination_bank,
            total_debt = %account.total_debt,
            "recorded payment"
        );
        Ok(PaymentReceipt {
            account,
            increment,
            bank,
        })
    }

    /// Replay one account's history and overwrite its balances.
    pub fn recompute(&self, account_id: &str) -> Result<Account> {
        let account = self.store.commit(account_id, Vec::new(), &mut |account, history| {
            account.rebuild(history);
        })?;
        debug!(account = account_id, total_debt = %account.total_debt, "recomputed");
        Ok(account)
    }

    pub fn recompute_all(&self) -> Result<Vec<Account>> {
        let accounts = self
            .accounts()?
            .iter()
            .map(|a| self.recompute(&a.id))
            .collect::<Result<Vec<_>>>()?;
        info!(accounts = accounts.len(), "recomputed all balances");
        Ok(accounts)
    }

    pub fn bank(&self) -> Result<Bank> {
        self.store.bank()
    }

    pub fn reset_bank(&self, scope: BankScope) -> Result<Bank> {
        let bank = self.store.reset_bank(scope, Utc::now())?;
        info!(?scope, "bank reset");
        Ok(bank)
    }

    /// Zero the bank and refill it from full replays of every account.
    pub fn rebuild_bank(&self) -> Result<Bank> {
        let mut total = BankIncrement::default();
        for account in self.store.accounts()? {
            let bank = reconcile(&self.store.events(&account.id)?).bank;
            total.print_bank += bank.print_bank;
            total.lamination_bank += bank.lamination_bank;
        }
        let now = Utc::now();
        self.store.reset_bank(BankScope::All, now)?;
        let bank = self.store.increment_bank(&total, now)?;
        info!(print_bank = %bank.print_bank, lamination_bank = %bank.lamination_bank, "bank rebuilt");
        Ok(bank)
    }
}
