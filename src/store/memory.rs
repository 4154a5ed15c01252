use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::error::{BillingError, Result};
use crate::ledger::{Account, Bank, BankIncrement, BankScope, Event};
use crate::store::{LedgerState, LedgerStore};

/// Process-local store. Every operation holds one mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LedgerState) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().map_err(|_| BillingError::LockPoisoned)?;
        f(&mut state)
    }
}

impl LedgerStore for MemoryStore {
    fn account(&self, id: &str) -> Result<Option<Account>> {
        self.with_state(|s| Ok(s.account(id).cloned()))
    }

    fn accounts(&self) -> Result<Vec<Account>> {
        self.with_state(|s| Ok(s.accounts.clone()))
    }

    fn create_account(&self, account: Account) -> Result<()> {
        self.with_state(|s| s.create_account(account))
    }

    fn events(&self, account_id: &str) -> Result<Vec<Event>> {
        self.with_state(|s| Ok(s.events(account_id)))
    }

    fn commit(
        &self,
        account_id: &str,
        events: Vec<Event>,
        update: &mut dyn FnMut(&mut Account, &[Event]),
    ) -> Result<Account> {
        self.with_state(|s| s.commit(account_id, events, update))
    }

    fn bank(&self) -> Result<Bank> {
        self.with_state(|s| Ok(s.bank.clone()))
    }

    fn increment_bank(&self, increment: &BankIncrement, at: DateTime<Utc>) -> Result<Bank> {
        self.with_state(|s| Ok(s.increment_bank(increment, at)))
    }

    fn reset_bank(&self, scope: BankScope, at: DateTime<Utc>) -> Result<Bank> {
        self.with_state(|s| Ok(s.reset_bank(scope, at)))
    }
}
