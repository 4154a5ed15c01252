mod file;
mod memory;
mod state;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use state::LedgerState;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::ledger::{Account, Bank, BankIncrement, BankScope, Event};

/// Storage for accounts, their event logs and the bank aggregate.
///
/// Implementations must make `commit` an atomic read-modify-write of one
/// account: two commits for the same account never interleave. Bank
/// operations are atomic on their own and are not tied to account commits.
pub trait LedgerStore: Send + Sync {
    fn account(&self, id: &str) -> Result<Option<Account>>;

    fn accounts(&self) -> Result<Vec<Account>>;

    /// Fails with `AccountExists` if the id is taken.
    fn create_account(&self, account: Account) -> Result<()>;

    /// The account's events in insertion order.
    fn events(&self, account_id: &str) -> Result<Vec<Event>>;

    /// Append `events` to the account's log, then let `update` rewrite the
    /// account from its full history. Fails with `AccountNotFound`.
    fn commit(
        &self,
        account_id: &str,
        events: Vec<Event>,
        update: &mut dyn FnMut(&mut Account, &[Event]),
    ) -> Result<Account>;

    fn append_event(
        &self,
        account_id: &str,
        event: Event,
        update: &mut dyn FnMut(&mut Account, &[Event]),
    ) -> Result<Account> {
        self.commit(account_id, vec![event], update)
    }

    fn bank(&self) -> Result<Bank>;

    fn increment_bank(&self, increment: &BankIncrement, at: DateTime<Utc>) -> Result<Bank>;

    fn reset_bank(&self, scope: BankScope, at: DateTime<Utc>) -> Result<Bank>;
}
