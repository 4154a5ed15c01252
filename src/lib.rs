pub mod billing;
pub mod config;
pub mod error;
pub mod ledger;
pub mod money;
pub mod simulate;
pub mod store;

pub use billing::{Billing, PaymentReceipt};
pub use config::{BillingSettings, Config};
pub use error::{BillingError, Result};
pub use ledger::{reconcile, Account, Balances, Bank, BankIncrement, Category, Event, Reconciliation};
pub use money::Money;
pub use simulate::{generate_payments, Payment, PaymentSimulator, SimulatorSettings};
pub use store::{FileStore, LedgerStore, MemoryStore};
