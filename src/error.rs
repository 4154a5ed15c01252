use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Data directory not found at {0}. Run 'printbill init' to create it.")]
    DataDirNotFound(PathBuf),

    #[error("Data directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to read ledger {path}: {source}")]
    LedgerParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting {0}")]
    InvalidSetting(String),

    #[error("Failed to write ledger state: {0}")]
    StateWrite(#[from] toml::ser::Error),

    #[error("Account '{0}' not found")]
    AccountNotFound(String),

    #[error("Account '{0}' already exists")]
    AccountExists(String),

    #[error("Invalid amount {0}: amounts must be between 0.00 and {max}", max = crate::money::Money::MAX_AMOUNT)]
    InvalidAmount(String),

    #[error("Invalid money value '{0}'")]
    InvalidMoney(String),

    #[error("Invalid category '{0}'. Use 'individual', 'team', 'unit' or 'sector'.")]
    InvalidCategory(String),

    #[error("Invalid date '{0}'. Use YYYY-MM-DD or an RFC 3339 timestamp.")]
    InvalidDate(String),

    #[error("Store already holds {0} account(s); seeding needs an empty ledger")]
    StoreNotEmpty(usize),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ledger store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;
