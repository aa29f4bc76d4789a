use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const LAYOUT: &str = r#"
defaults:
  chart_type: scatter_plot
  num_plots: 3
overrides:
  CA:
    chart_type: bar_chart
entities: [CA, TX]
"#;

fn layout_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("layout.yaml");
    fs::write(&path, LAYOUT).unwrap();
    path
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("gallery"));
}

#[test]
fn list_prints_builtin_modules() {
    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.arg("list");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ID: scatter_plot"))
        .stdout(predicate::str::contains("ID: heatmap"));
}

#[test]
fn spec_prints_json_and_rejects_unknown_plots() {
    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.args(["spec", "--plot", "bar_chart", "--seed", "42", "--param", "num_categories=2"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["data"]["values"].as_array().unwrap().len(), 2);

    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.args(["spec", "--plot", "pie"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown plot"));
}

#[test]
fn missing_config_is_a_usage_error() {
    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.args(["build", "--config", "/no/such/layout.yaml"]);
    cmd.assert().failure().code(2);
}

#[test]
fn non_positive_numbers_are_usage_errors() {
    let dir = TempDir::new().unwrap();
    let layout = layout_file(&dir);
    for flag in ["--num-plots", "--max-concurrent"] {
        let mut cmd = Command::cargo_bin("gallery").unwrap();
        cmd.arg("build").arg("--config").arg(&layout).args([flag, "0"]);
        cmd.assert().failure().code(2);
    }
}

#[test]
fn build_writes_site_and_catalog() {
    let dir = TempDir::new().unwrap();
    let layout = layout_file(&dir);
    let out = dir.path().join("docs");
    let catalog = dir.path().join("catalog.csv");

    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.arg("build")
        .arg("--config")
        .arg(&layout)
        .arg("--out")
        .arg(&out)
        .arg("--catalog")
        .arg(&catalog)
        .args(["--num-plots", "4", "--stats"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pages=2 plots=8"));

    for f in ["index.html", "CA.html", "TX.html", "lazy-loader.js"] {
        assert!(out.join(f).exists(), "{f} missing");
    }
    let csv_txt = fs::read_to_string(&catalog).unwrap();
    assert_eq!(csv_txt.lines().count(), 1 + 8);
}

#[test]
fn repeated_entities_are_rejected() {
    let dir = TempDir::new().unwrap();
    let layout = layout_file(&dir);
    let out = dir.path().join("docs");

    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.arg("build")
        .arg("--config")
        .arg(&layout)
        .arg("--out")
        .arg(&out)
        .args(["--entities", "CA,TX,CA"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("`CA` is listed more than once"));
    assert!(!out.exists());
}

#[test]
fn simulate_reports_schedule() {
    let dir = TempDir::new().unwrap();
    let layout = layout_file(&dir);
    let mut cmd = Command::cargo_bin("gallery").unwrap();
    cmd.arg("simulate")
        .arg("--config")
        .arg(&layout)
        .args(["--entity", "CA", "--max-concurrent", "2", "--fail", "vis-CA-1"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("charts=3 cap=2"))
        .stdout(predicate::str::contains("settled=3 failed=1"))
        .stdout(predicate::str::contains("vis-CA-1 (failed)"));
}
