use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use printbill::config::{data_dir, load_config, Config, CONFIG_FILE, CONFIG_TEMPLATE};
use printbill::ledger::{parse_timestamp, BankScope, Category, ChargeKind, EventKind, Replay};
use printbill::simulate::{seed, PaymentSimulator, SeedOptions};
use printbill::store::FileStore;
use printbill::{Account, Billing, BillingError, Money, Result};

#[derive(Parser)]
#[command(name = "printbill")]
#[command(version, about = "Print and lamination billing ledger", long_about = None)]
struct Cli {
    /// Path to data directory (default: platform config dir or ~/.printbill)
    #[arg(short = 'C', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory with a config template
    Init,

    /// Manage accounts
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },

    /// List accounts with their balances
    Accounts {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Record a print or lamination job
    Charge {
        /// Account identifier
        account: String,

        /// Job price
        #[arg(allow_hyphen_values = true)]
        amount: Money,

        /// Job kind (print, lamination)
        #[arg(short, long)]
        kind: ChargeKind,

        /// Job date, YYYY-MM-DD or RFC 3339 (default: now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a payment
    Pay {
        /// Account identifier
        account: String,

        /// Amount received
        #[arg(allow_hyphen_values = true)]
        amount: Money,

        /// Payment date, YYYY-MM-DD or RFC 3339 (default: now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show an account's events with running balances
    History {
        /// Account identifier
        account: String,
    },

    /// Replay history and overwrite stored balances
    Recompute {
        /// Only this account (default: all)
        account: Option<String>,
    },

    /// Show collected totals
    Bank {
        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Zero collected totals
    BankReset {
        /// Which totals to zero (print, lamination, all)
        #[arg(long, default_value = "all")]
        scope: BankScope,
    },

    /// Refill collected totals from every account's history
    RebuildBank,

    /// Fill an empty ledger with demo accounts, jobs and payments
    Seed {
        /// Months of job history
        #[arg(long, default_value_t = 3)]
        months: u32,

        /// Number of teams (six accounts each)
        #[arg(long, default_value_t = 8)]
        teams: usize,

        /// RNG seed for a reproducible ledger
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Preview simulated payments for one billing period
    Simulate {
        /// Account category (individual, team, unit, sector)
        category: Category,

        /// Amount charged in the period
        total: Money,

        /// Period start, YYYY-MM-DD or RFC 3339 (default: now)
        #[arg(long)]
        start: Option<String>,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show ledger summary
    Status,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Open a new account
    Add {
        /// Unique account identifier
        id: String,

        /// Display name (default: the id)
        #[arg(short, long)]
        name: Option<String>,

        /// Account category (individual, team, unit, sector)
        #[arg(short, long, default_value = "individual")]
        category: Category,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dir = match cli.data_dir {
        Some(p) => p,
        None => data_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&dir),
        Commands::Account {
            action: AccountCommand::Add { id, name, category },
        } => cmd_account_add(&dir, &id, name.as_deref(), category),
        Commands::Accounts { json } => cmd_accounts(&dir, json),
        Commands::Charge {
            account,
            amount,
            kind,
            date,
        } => cmd_charge(&dir, &account, kind, amount, date.as_deref()),
        Commands::Pay {
            account,
            amount,
            date,
        } => cmd_pay(&dir, &account, amount, date.as_deref()),
        Commands::History { account } => cmd_history(&dir, &account),
        Commands::Recompute { account } => cmd_recompute(&dir, account.as_deref()),
        Commands::Bank { json } => cmd_bank(&dir, json),
        Commands::BankReset { scope } => cmd_bank_reset(&dir, scope),
        Commands::RebuildBank => cmd_rebuild_bank(&dir),
        Commands::Seed {
            months,
            teams,
            seed,
        } => cmd_seed(&dir, months, teams, seed),
        Commands::Simulate {
            category,
            total,
            start,
            seed,
        } => cmd_simulate(&dir, category, total, start.as_deref(), seed),
        Commands::Status => cmd_status(&dir),
    }
}

/// Config and ledger for an initialized data directory
fn open(dir: &Path) -> Result<(Config, Billing<FileStore>)> {
    if !dir.exists() {
        return Err(BillingError::DataDirNotFound(dir.to_path_buf()));
    }
    let config = load_config(dir)?;
    Ok((config, Billing::new(FileStore::open(dir))))
}

fn when(date: Option<&str>) -> Result<DateTime<Utc>> {
    date.map(parse_timestamp).unwrap_or_else(|| Ok(Utc::now()))
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn format_money(value: Money, symbol: &str) -> String {
    if value.is_negative() {
        format!("-{symbol}{}", -value)
    } else {
        format!("{symbol}{value}")
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Initialize the data directory with a config template
fn cmd_init(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Err(BillingError::AlreadyInitialized(dir.to_path_buf()));
    }

    fs::create_dir_all(dir)?;
    fs::write(dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;

    println!("Initialized printbill data at: {}", dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Adjust currency and simulator settings:  $EDITOR {}/{CONFIG_FILE}",
        dir.display()
    );
    println!("  2. Open an account:  printbill account add <id> --category team");
    println!("     or load demo data:  printbill seed");

    Ok(())
}

fn cmd_account_add(dir: &Path, id: &str, name: Option<&str>, category: Category) -> Result<()> {
    let (_, billing) = open(dir)?;
    let account = billing.open_account(id, name.unwrap_or(id), category)?;
    println!("Opened account {} ({})", account.id, account.category);
    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "PRINT")]
    print: String,
    #[tabled(rename = "LAMINATION")]
    lamination: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "LAST PAYMENT")]
    last_payment: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "PRINT")]
    print: String,
    #[tabled(rename = "LAMINATION")]
    lamination: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "DAY")]
    day: i64,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

fn account_row(account: &Account, symbol: &str) -> AccountRow {
    AccountRow {
        id: account.id.clone(),
        name: account.name.clone(),
        category: account.category.to_string(),
        print: format_money(account.print_debt, symbol),
        lamination: format_money(account.lamination_debt, symbol),
        total: format_money(account.total_debt, symbol),
        last_payment: account
            .last_payment
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}

/// List accounts with their balances
fn cmd_accounts(dir: &Path, json: bool) -> Result<()> {
    let (config, billing) = open(dir)?;
    let accounts = billing.accounts()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        println!("No accounts yet.");
        println!("Add one with: printbill account add <id>");
        return Ok(());
    }

    let symbol = &config.billing.currency_symbol;
    let rows: Vec<AccountRow> = accounts.iter().map(|a| account_row(a, symbol)).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

fn cmd_charge(
    dir: &Path,
    account_id: &str,
    kind: ChargeKind,
    amount: Money,
    date: Option<&str>,
) -> Result<()> {
    let (config, billing) = open(dir)?;
    let at = when(date)?;
    let account = billing.record_charge(account_id, kind, amount, at)?;
    let symbol = &config.billing.currency_symbol;

    println!(
        "Charged {} for {} to {}",
        format_money(amount, symbol),
        EventKind::from(kind),
        account.id
    );
    println!("  Total debt: {}", format_money(account.total_debt, symbol));
    Ok(())
}

fn cmd_pay(dir: &Path, account_id: &str, amount: Money, date: Option<&str>) -> Result<()> {
    let (config, billing) = open(dir)?;
    let receipt = billing.record_payment(account_id, amount, when(date)?)?;
    let symbol = &config.billing.currency_symbol;

    println!(
        "Recorded payment of {} from {}",
        format_money(amount, symbol),
        receipt.account.id
    );
    println!(
        "  Lamination: {}  Print: {}",
        format_money(receipt.increment.lamination_bank, symbol),
        format_money(receipt.increment.print_bank, symbol)
    );
    println!(
        "  Total debt: {}",
        format_money(receipt.account.total_debt, symbol)
    );
    Ok(())
}

/// Show an account's events with running balances
fn cmd_history(dir: &Path, account_id: &str) -> Result<()> {
    let (config, billing) = open(dir)?;
    let events = billing.history(account_id)?;
    let symbol = &config.billing.currency_symbol;

    println!("History for {account_id}");
    if events.is_empty() {
        println!("  No events recorded.");
        return Ok(());
    }

    let mut replay = Replay::new();
    let rows: Vec<HistoryRow> = events
        .iter()
        .map(|event| {
            replay.apply(event);
            let balances = replay.balances();
            HistoryRow {
                date: format_date(event.timestamp),
                kind: event.kind.to_string(),
                amount: format_money(event.amount, symbol),
                print: format_money(balances.print_debt, symbol),
                lamination: format_money(balances.lamination_debt, symbol),
                total: format_money(balances.total_debt, symbol),
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn cmd_recompute(dir: &Path, account_id: Option<&str>) -> Result<()> {
    let (config, billing) = open(dir)?;
    match account_id {
        Some(id) => {
            let account = billing.recompute(id)?;
            println!(
                "Recomputed {}: total debt {}",
                account.id,
                format_money(account.total_debt, &config.billing.currency_symbol)
            );
        }
        None => {
            let accounts = billing.recompute_all()?;
            println!("Recomputed {} account(s)", accounts.len());
        }
    }
    Ok(())
}

fn cmd_bank(dir: &Path, json: bool) -> Result<()> {
    let (config, billing) = open(dir)?;
    let bank = billing.bank()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bank)?);
        return Ok(());
    }

    let symbol = &config.billing.currency_symbol;
    println!("Print bank:       {}", format_money(bank.print_bank, symbol));
    println!("Lamination bank:  {}", format_money(bank.lamination_bank, symbol));
    println!("Total collected:  {}", format_money(bank.total(), symbol));
    if let Some(at) = bank.last_updated {
        println!("Last updated:     {}", format_date(at));
    }
    Ok(())
}

fn cmd_bank_reset(dir: &Path, scope: BankScope) -> Result<()> {
    let (config, billing) = open(dir)?;
    let bank = billing.reset_bank(scope)?;
    println!(
        "Bank reset. Total collected now {}",
        format_money(bank.total(), &config.billing.currency_symbol)
    );
    Ok(())
}

fn cmd_rebuild_bank(dir: &Path) -> Result<()> {
    let (config, billing) = open(dir)?;
    let bank = billing.rebuild_bank()?;
    let symbol = &config.billing.currency_symbol;
    println!("Rebuilt bank from account histories");
    println!("  Print bank:       {}", format_money(bank.print_bank, symbol));
    println!("  Lamination bank:  {}", format_money(bank.lamination_bank, symbol));
    Ok(())
}

fn cmd_seed(dir: &Path, months: u32, teams: usize, rng_seed: Option<u64>) -> Result<()> {
    let (config, billing) = open(dir)?;
    let simulator = PaymentSimulator::new(config.simulator);
    let options = SeedOptions {
        teams,
        months,
        now: Utc::now(),
    };

    let report = seed(billing.store(), &simulator, &options, &mut rng_for(rng_seed))?;
    let symbol = &config.billing.currency_symbol;

    println!("Seeded demo ledger");
    println!("  Accounts:         {}", report.accounts);
    println!("  Print jobs:       {}", report.print_jobs);
    println!("  Lamination jobs:  {}", report.lamination_jobs);
    println!("  Payments:         {}", report.payments);
    println!(
        "  Collected:        {} print, {} lamination",
        format_money(report.bank.print_bank, symbol),
        format_money(report.bank.lamination_bank, symbol)
    );
    Ok(())
}

/// Preview payments; works without an initialized data directory
fn cmd_simulate(
    dir: &Path,
    category: Category,
    total: Money,
    start: Option<&str>,
    rng_seed: Option<u64>,
) -> Result<()> {
    let config = match load_config(dir) {
        Ok(config) => config,
        Err(BillingError::ConfigFileNotFound(_)) => Config::default(),
        Err(e) => return Err(e),
    };
    let total = total.ensure_amount()?;
    let start = when(start)?;
    let simulator = PaymentSimulator::new(config.simulator);
    let payments = simulator.generate(category, total, start, &mut rng_for(rng_seed));
    let symbol = &config.billing.currency_symbol;

    println!(
        "Simulated payments for a {category} period of {}",
        format_money(total, symbol)
    );
    if payments.is_empty() {
        println!("  No payments.");
        return Ok(());
    }

    let rows: Vec<PaymentRow> = payments
        .iter()
        .enumerate()
        .map(|(idx, p)| PaymentRow {
            index: idx + 1,
            date: format_date(p.timestamp),
            day: (p.timestamp - start).num_days(),
            amount: format_money(p.amount, symbol),
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    let paid: Money = payments.iter().map(|p| p.amount).sum();
    println!(
        "Total paid: {} / {}",
        format_money(paid, symbol),
        format_money(total, symbol)
    );
    Ok(())
}

/// Show ledger summary
fn cmd_status(dir: &Path) -> Result<()> {
    let (config, billing) = open(dir)?;
    let accounts = billing.accounts()?;
    let bank = billing.bank()?;
    let symbol = &config.billing.currency_symbol;

    let outstanding: Money = accounts
        .iter()
        .map(|a| a.total_debt)
        .filter(|d| d.is_positive())
        .sum();
    let credit: Money = accounts
        .iter()
        .map(|a| a.total_debt)
        .filter(|d| d.is_negative())
        .map(|d| -d)
        .sum();

    println!("Ledger Status");
    println!("{}", "-".repeat(50));
    println!("Data directory:   {}", dir.display());
    println!("Accounts:         {}", accounts.len());
    for category in Category::ALL {
        let count = accounts.iter().filter(|a| a.category == category).count();
        if count > 0 {
            println!("  {:<16}{}", category.as_str(), count);
        }
    }
    println!("Outstanding debt: {}", format_money(outstanding, symbol));
    println!("Held as credit:   {}", format_money(credit, symbol));
    println!("Collected:        {}", format_money(bank.total(), symbol));

    Ok(())
}
