//! Integration tests for the batchseq binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn batchseq() -> Command {
    let mut cmd = Command::cargo_bin("batchseq").unwrap();
    // Keep the host environment from leaking into the run.
    for var in [
        "BATCHSEQ_DIALECT",
        "BATCHSEQ_SEQUENCE",
        "BATCHSEQ_CATALOG",
        "BATCHSEQ_SCHEMA",
        "BATCHSEQ_FETCH_SIZE",
        "BATCHSEQ_ID_TYPE",
        "BATCHSEQ_THREADS",
        "BATCHSEQ_IDS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help() {
    batchseq()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fetch-size"))
        .stdout(predicate::str::contains("BATCHSEQ_SEQUENCE"));
}

#[test]
fn test_version() {
    batchseq()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("batchseq"));
}

#[test]
fn test_sequence_required() {
    batchseq()
        .arg("--sql-only")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--sequence"));
}

#[test]
fn test_sql_only_postgres() {
    batchseq()
        .args(["--sequence", "seq_parent_id", "--sql-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "SELECT nextval('seq_parent_id') FROM generate_series(1, ?)",
        ))
        .stdout(predicate::str::contains("create sequence seq_parent_id start 1 increment 1"))
        .stdout(predicate::str::contains("round trips").not());
}

#[test]
fn test_sql_only_oracle_from_env() {
    batchseq()
        .args(["--sql-only"])
        .env("BATCHSEQ_DIALECT", "oracle")
        .env("BATCHSEQ_SEQUENCE", "seq_parent_id")
        .env("BATCHSEQ_SCHEMA", "app")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "SELECT app.seq_parent_id.nextval FROM dual CONNECT BY rownum <= ?",
        ));
}

#[test]
fn test_sql_only_sqlserver_quoted() {
    batchseq()
        .args(["--dialect", "sqlserver", "--sequence", "\"Sales\".seq_order", "--sql-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("next value for [Sales].seq_order"));
}

#[test]
fn test_generation_reports_distinct_ids() {
    batchseq()
        .args([
            "--sequence",
            "seq_parent_id",
            "--fetch-size",
            "10",
            "--threads",
            "4",
            "--ids",
            "25",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("distinct:      100"))
        .stdout(predicate::str::is_match(r"round trips:\s+10\n").unwrap())
        .stderr(predicate::str::is_match(r"elapsed\S*=\S*\d+(\.\d+)?(ns|µs|ms|s)").unwrap());
}

#[test]
fn test_invalid_fetch_size() {
    batchseq()
        .args(["--sequence", "seq_parent_id", "--fetch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fetch size"));
}

#[test]
fn test_unknown_dialect() {
    batchseq()
        .args(["--sequence", "seq_parent_id", "--dialect", "sybase"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BATCHSEQ_DIALECT"));
}
