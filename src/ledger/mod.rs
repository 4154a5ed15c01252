mod account;
pub mod engine;
mod event;

pub use account::{Account, Bank, BankScope, Category};
pub use engine::{chronological, contribution, reconcile, Balances, BankIncrement, Reconciliation, Replay};
pub use event::{parse_timestamp, ChargeKind, Event, EventKind};
