//! Smoke tests -- verify the binary runs and renders a report.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn write_fixture(dir: &Path) -> PathBuf {
    let mut body =
        String::from("country_code,created_at_bucketed,count_payments,sum_auth_intent_amount\n");
    for (code, base, dip) in [("US", (100, 10_000), (80, 8_000)), ("CA", (50, 5_000), (45, 4_500))] {
        for i in 0..48 {
            let minutes = 17 * 60 + 5 * i;
            let in_sev = (18 * 60 + 30..=19 * 60 + 30).contains(&minutes);
            let (count, amount) = if in_sev { dip } else { base };
            body.push_str(&format!(
                "{code},2022-07-15 {:02}:{:02}:00+00,{count},{amount}\n",
                minutes / 60,
                minutes % 60
            ));
        }
    }
    let csv = dir.join("export.csv");
    std::fs::write(&csv, body).unwrap();

    let config = dir.join("sevimpact.toml");
    std::fs::write(
        &config,
        format!(
            "input_path = {:?}\ncountries = [\"US\", \"CA\"]\n",
            csv.display().to_string()
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("sevimpact")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("best-fit baseline"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("sevimpact")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sevimpact"));
}

#[test]
fn test_report_subcommand_exists() {
    Command::cargo_bin("sevimpact")
        .unwrap()
        .args(["report", "--help"])
        .assert()
        .success();
}

#[test]
fn test_report_renders_lines() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    Command::cargo_bin("sevimpact")
        .unwrap()
        .arg("report")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Estimated loss in payments as compared to a best-fit regression",
        ))
        .stdout(predicate::str::contains(
            " SEV from 2022-07-15 18:30:00+00 to 2022-07-15 19:30:00+00",
        ))
        .stdout(predicate::str::contains(
            "{'CA'} ## Count Diff:       65, Amount Diff:            65.0",
        ))
        .stdout(predicate::str::contains(
            "{}     ## Count Diff:      325, Amount Diff:           325.0",
        ));
}

#[test]
fn test_report_stdout_is_byte_identical() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    let run = || {
        Command::cargo_bin("sevimpact")
            .unwrap()
            .arg("report")
            .arg("--config")
            .arg(&config)
            .output()
            .unwrap()
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_report_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    let output = Command::cargo_bin("sevimpact")
        .unwrap()
        .args(["report", "--json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total"]["count_diff"], 325);
    assert_eq!(value["countries"][0]["label"], "{'US'}");
}

#[test]
fn test_countries_lists_codes() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    Command::cargo_bin("sevimpact")
        .unwrap()
        .arg("countries")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("CA       | 48"))
        .stdout(predicate::str::contains("US       | 48"));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    Command::cargo_bin("sevimpact")
        .unwrap()
        .arg("report")
        .arg("--config")
        .arg(&config)
        .arg("--input")
        .arg(dir.path().join("missing.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.csv"));
}
