use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn printbill_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("printbill"))
}

/// Run a command against `dir` and require success.
fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = printbill_cmd()
        .arg("-C")
        .arg(dir)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).unwrap()
}

fn init_data_dir() -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("printbill-data");
    run_ok(&data_path, &["init"]);
    (temp_dir, data_path)
}

fn accounts_json(dir: &Path) -> Vec<Value> {
    let out = run_ok(dir, &["accounts", "--json"]);
    serde_json::from_str::<Vec<Value>>(&out).unwrap()
}

fn account_json(dir: &Path, id: &str) -> Value {
    accounts_json(dir)
        .into_iter()
        .find(|a| a["id"] == id)
        .unwrap()
}

fn bank_json(dir: &Path) -> Value {
    serde_json::from_str(&run_ok(dir, &["bank", "--json"])).unwrap()
}

#[test]
fn test_help() {
    printbill_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Print and lamination billing ledger"));
}

#[test]
fn test_version() {
    printbill_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("printbill"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("printbill-data");

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized printbill data"));

    assert!(data_path.join("config.toml").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let (_temp, data_path) = init_data_dir();

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("nonexistent");

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_account_add_and_list() {
    let (_temp, data_path) = init_data_dir();

    let out = run_ok(
        &data_path,
        &["account", "add", "team-a", "--name", "Team A", "--category", "team"],
    );
    assert!(out.contains("Opened account team-a (team)"));

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap(), "accounts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("team-a"))
        .stdout(predicate::str::contains("Team A"))
        .stdout(predicate::str::contains("€0.00"));

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap(), "account", "add", "team-a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_invalid_category_rejected() {
    let (_temp, data_path) = init_data_dir();

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap()])
        .args(["account", "add", "x", "--category", "guild"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("guild"));
}

#[test]
fn test_charge_unknown_account() {
    let (_temp, data_path) = init_data_dir();

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap()])
        .args(["charge", "ghost", "5", "--kind", "print"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Account 'ghost' not found"));
}

#[test]
fn test_negative_amount_rejected() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap()])
        .args(["pay", "u1", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));

    assert!(bank_json(&data_path)["print_bank"].as_f64().unwrap() == 0.0);
}

#[test]
fn test_oversized_amount_rejected() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);

    for _ in 0..2 {
        printbill_cmd()
            .args(["-C", data_path.to_str().unwrap()])
            .args(["charge", "u1", "90000000000000000", "--kind", "print"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid amount"));
    }
    assert_eq!(account_json(&data_path, "u1")["total_debt"].as_f64(), Some(0.0));

    run_ok(&data_path, &["charge", "u1", "1000000000", "--kind", "print"]);
    assert_eq!(
        account_json(&data_path, "u1")["total_debt"].as_f64(),
        Some(1_000_000_000.0)
    );

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap()])
        .args(["simulate", "team", "90000000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_payment_pays_lamination_first() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);
    run_ok(&data_path, &["charge", "u1", "12", "--kind", "print"]);
    run_ok(&data_path, &["charge", "u1", "5", "--kind", "lamination"]);

    let out = run_ok(&data_path, &["pay", "u1", "10"]);
    assert!(out.contains("Lamination: €5.00  Print: €5.00"));

    let account = account_json(&data_path, "u1");
    assert_eq!(account["print_debt"].as_f64(), Some(7.0));
    assert_eq!(account["lamination_debt"].as_f64(), Some(0.0));
    assert_eq!(account["total_debt"].as_f64(), Some(7.0));
    assert!(account["last_payment"].is_string());

    let bank = bank_json(&data_path);
    assert_eq!(bank["print_bank"].as_f64(), Some(5.0));
    assert_eq!(bank["lamination_bank"].as_f64(), Some(5.0));
}

#[test]
fn test_overpayment_becomes_credit() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);
    run_ok(&data_path, &["charge", "u1", "3", "--kind", "print"]);
    run_ok(&data_path, &["pay", "u1", "5"]);

    assert_eq!(account_json(&data_path, "u1")["total_debt"].as_f64(), Some(-2.0));
    assert_eq!(bank_json(&data_path)["print_bank"].as_f64(), Some(5.0));

    // Credit is consumed by the next job.
    run_ok(&data_path, &["charge", "u1", "1.5", "--kind", "lamination"]);
    let account = account_json(&data_path, "u1");
    assert_eq!(account["lamination_debt"].as_f64(), Some(0.0));
    assert_eq!(account["total_debt"].as_f64(), Some(-0.5));
}

#[test]
fn test_backdated_charge_replays_history() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);
    run_ok(&data_path, &["pay", "u1", "10", "--date", "2026-01-05"]);
    run_ok(&data_path, &["charge", "u1", "4", "--kind", "print", "--date", "2026-01-10"]);
    assert_eq!(account_json(&data_path, "u1")["total_debt"].as_f64(), Some(-6.0));

    run_ok(&data_path, &["charge", "u1", "3", "--kind", "lamination", "--date", "2026-01-01"]);
    let account = account_json(&data_path, "u1");
    assert_eq!(account["lamination_debt"].as_f64(), Some(0.0));
    assert_eq!(account["print_debt"].as_f64(), Some(0.0));
    assert_eq!(account["total_debt"].as_f64(), Some(-3.0));

    let out = run_ok(&data_path, &["history", "u1"]);
    let lamination = out.find("lamination").unwrap();
    let income = out.find("income").unwrap();
    assert!(lamination < income);
    assert!(out.contains("-€3.00"));
}

#[test]
fn test_invalid_date_rejected() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap()])
        .args(["pay", "u1", "1", "--date", "last tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_bank_reset_and_rebuild() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);
    run_ok(&data_path, &["charge", "u1", "2", "--kind", "lamination"]);
    run_ok(&data_path, &["pay", "u1", "6"]);

    run_ok(&data_path, &["bank-reset", "--scope", "print"]);
    let bank = bank_json(&data_path);
    assert_eq!(bank["print_bank"].as_f64(), Some(0.0));
    assert_eq!(bank["lamination_bank"].as_f64(), Some(2.0));

    run_ok(&data_path, &["rebuild-bank"]);
    let bank = bank_json(&data_path);
    assert_eq!(bank["print_bank"].as_f64(), Some(4.0));
    assert_eq!(bank["lamination_bank"].as_f64(), Some(2.0));
}

#[test]
fn test_seed_populates_ledger() {
    let (_temp, data_path) = init_data_dir();

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap()])
        .args(["seed", "--teams", "1", "--months", "2", "--seed", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accounts:         6"));

    let accounts = accounts_json(&data_path);
    assert_eq!(accounts.len(), 6);
    assert!(accounts.iter().any(|a| a["id"] == "sector-1"));

    // Stored balances already match a fresh replay.
    let before = serde_json::to_string(&accounts).unwrap();
    run_ok(&data_path, &["recompute"]);
    let after = serde_json::to_string(&accounts_json(&data_path)).unwrap();
    assert_eq!(before, after);

    let bank_before = bank_json(&data_path);
    run_ok(&data_path, &["rebuild-bank"]);
    let bank_after = bank_json(&data_path);
    assert_eq!(bank_before["print_bank"], bank_after["print_bank"]);
    assert_eq!(bank_before["lamination_bank"], bank_after["lamination_bank"]);

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap()])
        .args(["seed", "--teams", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs an empty ledger"));
}

#[test]
fn test_simulate_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("nonexistent");

    let run = || {
        printbill_cmd()
            .args(["-C", data_path.to_str().unwrap()])
            .args(["simulate", "team", "100", "--start", "2026-01-01", "--seed", "7"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Simulated payments for a team period of €100.00"))
            .get_output()
            .stdout
            .clone()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_status() {
    let (_temp, data_path) = init_data_dir();
    run_ok(&data_path, &["account", "add", "u1"]);
    run_ok(&data_path, &["account", "add", "s1", "--category", "sector"]);
    run_ok(&data_path, &["charge", "u1", "8", "--kind", "print"]);
    run_ok(&data_path, &["pay", "s1", "2"]);

    printbill_cmd()
        .args(["-C", data_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Accounts:         2"))
        .stdout(predicate::str::contains("Outstanding debt: €8.00"))
        .stdout(predicate::str::contains("Held as credit:   €2.00"))
        .stdout(predicate::str::contains("Collected:        €2.00"));
}
