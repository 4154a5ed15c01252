//! Demo data: a roster of accounts, a few months of print and lamination
//! jobs, and simulated payments for each monthly billing period.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{BillingError, Result};
use crate::ledger::{Account, Bank, BankIncrement, BankScope, Category, Event, EventKind};
use crate::money::Money;
use crate::simulate::payments::PaymentSimulator;
use crate::store::LedgerStore;

/// Print job types with their unit price in cents.
const PRINT_PRICES: [(&str, i64); 9] = [
    ("a4_bw", 5),
    ("a4_color", 25),
    ("a3_bw", 10),
    ("a3_color", 50),
    ("riso_a3", 20),
    ("riso_a4", 15),
    ("cardstock_a3", 20),
    ("cardstock_a4", 15),
    ("sticker", 10),
];

const LAMINATION_PRICES: [(&str, i64); 7] = [
    ("a3", 40),
    ("a4", 20),
    ("a5", 10),
    ("cards", 2),
    ("spiral", 15),
    ("colored_cardboard", 10),
    ("plastic_cover", 15),
];

/// Only the colour device takes anything other than A4 black & white.
const PRINTERS: [&str; 4] = ["color", "bw-1", "bw-2", "bw-3"];

#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Number of teams; each brings a lead, two members, and its own
    /// team, unit and sector accounts.
    pub teams: usize,
    /// Months of job history, counting the current one.
    pub months: u32,
    pub now: DateTime<Utc>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            teams: 8,
            months: 3,
            now: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub accounts: usize,
    pub print_jobs: usize,
    pub lamination_jobs: usize,
    pub payments: usize,
    pub bank: Bank,
}

fn roster(teams: usize, now: DateTime<Utc>) -> Vec<Account> {
    let mut accounts = Vec::with_capacity(teams * 6);
    for n in 1..=teams {
        accounts.push(Account::new(
            format!("lead-{n}"),
            format!("Team {n} lead"),
            Category::Individual,
            now,
        ));
        for member in ["a", "b"] {
            accounts.push(Account::new(
                format!("member-{n}{member}"),
                format!("Team {n} member {}", member.to_uppercase()),
                Category::Individual,
                now,
            ));
        }
        accounts.push(Account::new(format!("team-{n}"), format!("Team {n}"), Category::Team, now));
        accounts.push(Account::new(format!("unit-{n}"), format!("Unit {n}"), Category::Unit, now));
        accounts.push(Account::new(
            format!("sector-{n}"),
            format!("Sector {n}"),
            Category::Sector,
            now,
        ));
    }
    accounts
}

/// First day of the month `offset` months before `now`.
fn month_start(now: DateTime<Utc>, offset: u32) -> Result<NaiveDate> {
    let index = now.year() * 12 + now.month0() as i32 - offset as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .ok_or_else(|| BillingError::InvalidDate(format!("{offset} months before {now}")))
}

fn job_time<R: Rng>(month: NaiveDate, rng: &mut R) -> Result<DateTime<Utc>> {
    let day = month + Duration::days(rng.gen_range(0..28));
    day.and_hms_opt(rng.gen_range(8..18), rng.gen_range(0..60), 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| BillingError::InvalidDate(day.to_string()))
}

fn jobs_for_month<R: Rng>(month: NaiveDate, rng: &mut R) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for _ in 0..rng.gen_range(5..=10) {
        let at = job_time(month, rng)?;
        let colour = PRINTERS.choose(rng) == Some(&"color");
        for _ in 0..rng.gen_range(1..=3) {
            let (_, price) = if colour {
                PRINT_PRICES[rng.gen_range(0..PRINT_PRICES.len())]
            } else {
                PRINT_PRICES[0]
            };
            let quantity: i64 = rng.gen_range(1..=8);
            events.push(Event::print(Money::from_cents(price * quantity), at));
        }
    }

    for _ in 0..rng.gen_range(3..=6) {
        let (_, price) = LAMINATION_PRICES[rng.gen_range(0..LAMINATION_PRICES.len())];
        let quantity: i64 = rng.gen_range(1..=3);
        events.push(Event::lamination(
            Money::from_cents(price * quantity),
            job_time(month, rng)?,
        ));
    }

    Ok(events)
}

/// Fill an empty store with demo accounts, jobs and payments, then write
/// balances and the bank aggregate from full replays.
///
/// Jobs and payments that would fall after `options.now` are dropped.
pub fn seed<S, R>(
    store: &S,
    simulator: &PaymentSimulator,
    options: &SeedOptions,
    rng: &mut R,
) -> Result<SeedReport>
where
    S: LedgerStore + ?Sized,
    R: Rng,
{
    let existing = store.accounts()?.len();
    if existing > 0 {
        return Err(BillingError::StoreNotEmpty(existing));
    }

    let mut report = SeedReport::default();
    let mut bank_total = BankIncrement::default();

    for account in roster(options.teams, options.now) {
        let id = account.id.clone();
        let category = account.category;
        store.create_account(account)?;

        let mut events = Vec::new();
        let mut periods: BTreeMap<NaiveDate, Money> = BTreeMap::new();
        for offset in 0..options.months {
            let month = month_start(options.now, offset)?;
            let mut jobs = jobs_for_month(month, rng)?;
            jobs.retain(|e| e.timestamp <= options.now);
            let charged: Money = jobs.iter().map(|e| e.amount).sum();
            *periods.entry(month).or_default() += charged;
            events.extend(jobs);
        }

        for (month, total) in &periods {
            let Some(start) = month.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()) else {
                continue;
            };
            for payment in simulator.generate(category, *total, start, rng) {
                if payment.timestamp > options.now {
                    debug!(account = %id, period = %month, "skipping payment dated in the future");
                    continue;
                }
                events.push(payment.into_event());
            }
        }

        report.print_jobs += events.iter().filter(|e| e.kind == EventKind::Print).count();
        report.lamination_jobs += events
            .iter()
            .filter(|e| e.kind == EventKind::Lamination)
            .count();
        report.payments += events.iter().filter(|e| e.is_payment()).count();

        let mut bank = BankIncrement::default();
        let account = store.commit(&id, events, &mut |account, history| {
            bank = account.rebuild(history).bank;
        })?;
        bank_total.print_bank += bank.print_bank;
        bank_total.lamination_bank += bank.lamination_bank;
        debug!(account = %id, total_debt = %account.total_debt, "seeded account");
        report.accounts += 1;
    }

    store.reset_bank(BankScope::All, options.now)?;
    report.bank = store.increment_bank(&bank_total, options.now)?;

    info!(
        accounts = report.accounts,
        print_jobs = report.print_jobs,
        lamination_jobs = report.lamination_jobs,
        payments = report.payments,
        "seeded demo ledger"
    );
    Ok(report)
}
