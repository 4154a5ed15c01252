use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BillingError, Result};
use crate::ledger::{Account, Bank, BankIncrement, BankScope, Event};

/// Everything a store persists: accounts, per-account event logs and the
/// bank aggregate.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LedgerState {
    /// Last sequence number handed to an event.
    #[serde(default)]
    pub last_seq: u64,
    #[serde(default)]
    pub bank: Bank,
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Event logs keyed by account id, in insertion order.
    #[serde(default)]
    pub events: BTreeMap<String, Vec<Event>>,
}

impl LedgerState {
    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn create_account(&mut self, account: Account) -> Result<()> {
        if self.account(&account.id).is_some() {
            return Err(BillingError::AccountExists(account.id));
        }
        self.events.entry(account.id.clone()).or_default();
        self.accounts.push(account);
        Ok(())
    }

    pub fn events(&self, account_id: &str) -> Vec<Event> {
        self.events.get(account_id).cloned().unwrap_or_default()
    }

    pub fn commit(
        &mut self,
        account_id: &str,
        new_events: Vec<Event>,
        update: &mut dyn FnMut(&mut Account, &[Event]),
    ) -> Result<Account> {
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| BillingError::AccountNotFound(account_id.to_string()))?;

        let history = self.events.entry(account_id.to_string()).or_default();
        for mut event in new_events {
            self.last_seq += 1;
            event.seq = self.last_seq;
            history.push(event);
        }

        update(account, history);
        Ok(account.clone())
    }

    pub fn increment_bank(&mut self, increment: &BankIncrement, at: DateTime<Utc>) -> Bank {
        self.bank.apply(increment, at);
        self.bank.clone()
    }

    pub fn reset_bank(&mut self, scope: BankScope, at: DateTime<Utc>) -> Bank {
        self.bank.reset(scope, at);
        self.bank.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Category;
    use crate::money::Money;

    #[test]
    fn commit_assigns_increasing_sequence_numbers() {
        let now = Utc::now();
        let mut state = LedgerState::default();
        state
            .create_account(Account::new("a", "A", Category::Team, now))
            .unwrap();

        let events = vec![
            Event::print(Money::from_cents(100), now),
            Event::payment(Money::from_cents(50), now),
        ];
        let mut seen = 0;
        state
            .commit("a", events, &mut |_, history| seen = history.len())
            .unwrap();

        assert_eq!(seen, 2);
        let seqs: Vec<u64> = state.events("a").iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(state.last_seq, 2);
    }

    #[test]
    fn commit_to_unknown_account_fails_without_side_effects() {
        let mut state = LedgerState::default();
        let result = state.commit(
            "ghost",
            vec![Event::print(Money::from_cents(100), Utc::now())],
            &mut |_, _| {},
        );
        assert!(matches!(result, Err(BillingError::AccountNotFound(_))));
        assert!(state.events.is_empty());
        assert_eq!(state.last_seq, 0);
    }

    #[test]
    fn duplicate_account_is_rejected() {
        let now = Utc::now();
        let mut state = LedgerState::default();
        state
            .create_account(Account::new("a", "A", Category::Team, now))
            .unwrap();
        let again = state.create_account(Account::new("a", "Other", Category::Unit, now));
        assert!(matches!(again, Err(BillingError::AccountExists(_))));
        assert_eq!(state.accounts.len(), 1);
    }

    #[test]
    fn state_survives_toml_round_trip() {
        let now = Utc::now();
        let mut state = LedgerState::default();
        state
            .create_account(Account::new("team-1", "Team One", Category::Team, now))
            .unwrap();
        state
            .commit(
                "team-1",
                vec![Event::lamination(Money::from_cents(1234), now)],
                &mut |account, _| account.lamination_debt = Money::from_cents(1234),
            )
            .unwrap();

        let text = toml::to_string_pretty(&state).unwrap();
        let loaded: LedgerState = toml::from_str(&text).unwrap();
        assert_eq!(loaded.accounts, state.accounts);
        assert_eq!(loaded.events("team-1"), state.events("team-1"));
        assert_eq!(loaded.last_seq, 1);
    }
}
