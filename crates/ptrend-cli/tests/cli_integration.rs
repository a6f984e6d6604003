#![allow(deprecated)] // cargo_bin! macro doesn't exist yet in assert_cmd 2.1

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "timeStamp,elapsed,label,responseCode,success\n";

/// Command with an isolated config and no database from the environment
fn ptrend(workspace: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ptrend").unwrap();
    cmd.env("PTREND_CONFIG", workspace.path().join("config.toml"));
    cmd.env_remove("PTREND_DB");
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(workspace.path());
    cmd
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn jmeter_log(dir: &Path, name: &str, rows: &[(&str, &str)]) -> PathBuf {
    let mut text = String::from(HEADER);
    for (i, (label, elapsed)) in rows.iter().enumerate() {
        text.push_str(&format!("{i},{elapsed},{label},200,true\n"));
    }
    write_file(dir, name, &text)
}

fn wpt_result(dir: &Path, name: &str, id: &str, load_time: u32) -> PathBuf {
    let json = format!(
        r#"{{
  "data": {{
    "id": "{id}",
    "location": "Dulles:Chrome",
    "average": {{ "firstView": {{ "loadTime": {load_time}, "firstPaint": 300, "docTime": 1500 }} }},
    "standardDeviation": {{ "firstView": {{ "loadTime": 40 }} }},
    "median": {{ "firstView": {{ "loadTime": {load_time}, "firstPaint": 290 }} }}
  }}
}}"#
    );
    write_file(dir, name, &json)
}

/// Store three load test runs; "login" is missing from the second one
fn seed_jmeter_runs(workspace: &TempDir, db: &Path) {
    let dir = workspace.path();
    let logs = [
        ("release 1", vec![("login", "100"), ("login", "200"), ("search", "50")]),
        ("release 2", vec![("search", "70")]),
        ("release 3", vec![("login", "120"), ("search", "90")]),
    ];
    for (i, (description, rows)) in logs.iter().enumerate() {
        let log = jmeter_log(dir, &format!("run{i}.csv"), rows);
        ptrend(workspace)
            .args(["parse-jmeter", *description])
            .arg(&log)
            .arg("-f")
            .arg("--db")
            .arg(db)
            .assert()
            .success();
    }
}

// ============================================================================
// Basic CLI tests
// ============================================================================

#[test]
fn test_help() {
    let workspace = TempDir::new().unwrap();
    ptrend(&workspace)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse-jmeter"))
        .stdout(predicate::str::contains("parse-wpt"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("generate"));
}

#[test]
fn test_version() {
    let workspace = TempDir::new().unwrap();
    ptrend(&workspace)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ptrend"));
}

#[test]
fn test_completions_bash() {
    let workspace = TempDir::new().unwrap();
    ptrend(&workspace)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ptrend"));
}

// ============================================================================
// parse-jmeter
// ============================================================================

#[test]
fn test_parse_jmeter_stores_run() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    let log = jmeter_log(
        workspace.path(),
        "run.csv",
        &[("login", "100"), ("TC checkout", "900"), ("search", "40")],
    );

    ptrend(&workspace)
        .args(["parse-jmeter", "nightly, build 7"])
        .arg(&log)
        .args(["-f", "-i", "^TC "])
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored run 'nightly build 7': 2 requests"));

    ptrend(&workspace)
        .args(["runs", "--json", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"description\": \"nightly build 7\""));
}

#[test]
fn test_parse_jmeter_duplicate_description() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    let log = jmeter_log(workspace.path(), "run.csv", &[("login", "100")]);

    for expected in [0, 4] {
        ptrend(&workspace)
            .args(["parse-jmeter", "nightly", "-f", "--db"])
            .arg(&db)
            .arg(&log)
            .assert()
            .code(expected);
    }
}

#[test]
fn test_parse_jmeter_rejects_long_delimiter() {
    let workspace = TempDir::new().unwrap();
    let log = jmeter_log(workspace.path(), "run.csv", &[("login", "100")]);

    ptrend(&workspace)
        .args(["parse-jmeter", "nightly", "-d", ";;"])
        .arg(&log)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("exactly one character"));
}

#[test]
fn test_parse_jmeter_rejects_bad_pattern() {
    let workspace = TempDir::new().unwrap();
    let log = jmeter_log(workspace.path(), "run.csv", &[("login", "100")]);

    ptrend(&workspace)
        .args(["parse-jmeter", "nightly", "-i", "(unclosed"])
        .arg(&log)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a valid regex"));
}

#[test]
fn test_parse_jmeter_missing_input() {
    let workspace = TempDir::new().unwrap();

    ptrend(&workspace)
        .args(["parse-jmeter", "nightly", "does-not-exist.csv"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_parse_jmeter_directory_input() {
    let workspace = TempDir::new().unwrap();

    ptrend(&workspace)
        .args(["parse-jmeter", "nightly"])
        .arg(workspace.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is a directory"));
}

#[test]
fn test_parse_jmeter_skips_malformed_samples() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    let log = jmeter_log(
        workspace.path(),
        "run.csv",
        &[("login", "100"), ("login", "oops"), ("login", "300")],
    );

    ptrend(&workspace)
        .args(["parse-jmeter", "nightly", "-f", "--db"])
        .arg(&db)
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 requests from 2 samples"));

    let out = workspace.path().join("avg.csv");
    ptrend(&workspace)
        .args(["export", "--db"])
        .arg(&db)
        .arg("-n")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "Request\\Test,nightly\nlogin,200\n"
    );
}

// ============================================================================
// export
// ============================================================================

#[test]
fn test_export_leaves_missing_runs_empty() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);

    let out = workspace.path().join("max.csv");
    ptrend(&workspace)
        .args(["export", "-m", "max", "--db"])
        .arg(&db)
        .arg("-n")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "Request\\Test,release 1,release 2,release 3\n\
         login,200,,120\n\
         search,50,70,90\n"
    );
}

#[test]
fn test_export_custom_delimiter() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);

    let out = workspace.path().join("avg.csv");
    ptrend(&workspace)
        .args(["export", "-d", ";", "--db"])
        .arg(&db)
        .arg("-n")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("Request\\Test;release 1;release 2;release 3\n"));
    assert!(text.contains("login;150;;120\n"));
}

#[test]
fn test_export_metric_from_config() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);
    write_file(
        workspace.path(),
        "config.toml",
        "[defaults]\nmetric = \"min\"\ndelimiter = \"|\"\n",
    );

    let out = workspace.path().join("min.csv");
    ptrend(&workspace)
        .args(["export", "--db"])
        .arg(&db)
        .arg("-n")
        .arg(&out)
        .assert()
        .success();

    assert!(fs::read_to_string(&out).unwrap().contains("login|100||120\n"));
}

#[test]
fn test_export_unknown_metric() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);

    ptrend(&workspace)
        .args(["export", "-m", "p99", "--db"])
        .arg(&db)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown metric 'p99'"));
}

#[test]
fn test_export_missing_database() {
    let workspace = TempDir::new().unwrap();

    ptrend(&workspace)
        .args(["export", "--db", "missing.db"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Database does not exist"));
    assert!(!workspace.path().join("missing.db").exists());
}

#[test]
fn test_database_from_environment() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("env.db");
    let log = jmeter_log(workspace.path(), "run.csv", &[("login", "100")]);

    ptrend(&workspace)
        .env("PTREND_DB", &db)
        .args(["parse-jmeter", "nightly", "-f"])
        .arg(&log)
        .assert()
        .success();
    assert!(db.exists());
}

// ============================================================================
// WebPageTest
// ============================================================================

#[test]
fn test_wpt_parse_and_export() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");

    for (id, load) in [("180101_AB", 2100), ("180102_CD", 1900)] {
        let input = wpt_result(workspace.path(), &format!("{id}.json"), id, load);
        ptrend(&workspace)
            .arg("parse-wpt")
            .arg(&input)
            .arg("--db")
            .arg(&db)
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Stored run '{id} (Dulles:Chrome)'")));
    }

    let out = workspace.path().join("wpt.csv");
    ptrend(&workspace)
        .args(["export", "-s", "wpt", "-k", "med", "--db"])
        .arg(&db)
        .arg("-n")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("Request\\Test,180101_AB (Dulles:Chrome),180102_CD (Dulles:Chrome)\n"));
    assert!(text.contains("loadTime,2100,1900\n"));
    assert!(text.contains("firstPaint,290,290\n"));
}

#[test]
fn test_wpt_invalid_json() {
    let workspace = TempDir::new().unwrap();
    let input = write_file(workspace.path(), "broken.json", "{ not json");

    ptrend(&workspace)
        .arg("parse-wpt")
        .arg(&input)
        .assert()
        .code(6);
}

// ============================================================================
// generate / runs
// ============================================================================

#[test]
fn test_generate_html_report() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);

    let out_dir = workspace.path().join("report");
    fs::create_dir(&out_dir).unwrap();

    ptrend(&workspace)
        .args(["generate", "--db"])
        .arg(&db)
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success();

    let page = fs::read_to_string(out_dir.join("index.html")).unwrap();
    assert!(page.contains("JMeter performance trends"));
    assert!(page.contains(r#""tests":["release 1","release 2","release 3"]"#));
    assert!(page.contains(r#""max":[200.0,null,120.0]"#));
}

#[test]
fn test_generate_json_report() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);

    ptrend(&workspace)
        .args(["generate", "--json", "--db"])
        .arg(&db)
        .assert()
        .success();

    let text = fs::read_to_string(workspace.path().join("report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["tests"].as_array().unwrap().len(), 3);
    assert_eq!(report["results"]["login"]["average"][1], serde_json::Value::Null);
    assert_eq!(report["results"]["search"]["average"][1], 70.0);
}

#[test]
fn test_generate_output_must_be_directory() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);

    ptrend(&workspace)
        .args(["generate", "-o", "no/such/dir", "--db"])
        .arg(&db)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("existing directory"));
}

#[test]
fn test_runs_table() {
    let workspace = TempDir::new().unwrap();
    let db = workspace.path().join("trends.db");
    seed_jmeter_runs(&workspace, &db);

    ptrend(&workspace)
        .args(["runs", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("release 1"))
        .stdout(predicate::str::contains("release 3"));

    ptrend(&workspace)
        .args(["runs", "-s", "wpt", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("No wpt runs stored"));
}
