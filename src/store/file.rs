use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{BillingError, Result};
use crate::ledger::{Account, Bank, BankIncrement, BankScope, Event};
use crate::store::{LedgerState, LedgerStore};

/// Store backed by a single `ledger.toml` in the data directory.
///
/// Each operation loads the file, applies the change and writes it back
/// through a temporary file, all while holding the store's mutex.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "ledger.toml";

    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load ledger.toml (empty ledger if missing)
    fn load(&self) -> Result<LedgerState> {
        if !self.path.exists() {
            return Ok(LedgerState::default());
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| BillingError::LedgerParse {
            path: self.path.clone(),
            source: e,
        })
    }

    fn save(&self, state: &LedgerState) -> Result<()> {
        let content = toml::to_string_pretty(state)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), accounts = state.accounts.len(), "saved ledger");
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| BillingError::LockPoisoned)?;
        let state = self.load()?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut LedgerState) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| BillingError::LockPoisoned)?;
        let mut state = self.load()?;
        let out = f(&mut state)?;
        self.save(&state)?;
        Ok(out)
    }
}

impl LedgerStore for FileStore {
    fn account(&self, id: &str) -> Result<Option<Account>> {
        self.read(|s| s.account(id).cloned())
    }

    fn accounts(&self) -> Result<Vec<Account>> {
        self.read(|s| s.accounts.clone())
    }

    fn create_account(&self, account: Account) -> Result<()> {
        self.write(|s| s.create_account(account))
    }

    fn events(&self, account_id: &str) -> Result<Vec<Event>> {
        self.read(|s| s.events(account_id))
    }

    fn commit(
        &self,
        account_id: &str,
        events: Vec<Event>,
        update: &mut dyn FnMut(&mut Account, &[Event]),
    ) -> Result<Account> {
        self.write(|s| s.commit(account_id, events, update))
    }

    fn bank(&self) -> Result<Bank> {
        self.read(|s| s.bank.clone())
    }

    fn increment_bank(&self, increment: &BankIncrement, at: DateTime<Utc>) -> Result<Bank> {
        self.write(|s| Ok(s.increment_bank(increment, at)))
    }

    fn reset_bank(&self, scope: BankScope, at: DateTime<Utc>) -> Result<Bank> {
        self.write(|s| Ok(s.reset_bank(scope, at)))
    }
}
