use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Unreachable on purpose: connections are refused immediately.
const DEAD_BASE_URL: &str = "http://127.0.0.1:1";

fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

#[allow(deprecated)]
fn driveby() -> Command {
    let mut cmd = Command::cargo_bin("driveby").expect("Failed to find driveby binary");
    cmd.env("NO_COLOR", "1")
        .env_remove("DRIVEBY_BASE_URL")
        .env_remove("DRIVEBY_TOKEN")
        .env_remove("DRIVEBY_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("Failed to run driveby");
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ============================================================================
// check command tests
// ============================================================================

#[test]
fn test_check_valid_contract() {
    driveby()
        .arg("check")
        .arg(fixture_path("petstore.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Petstore"))
        .stdout(predicate::str::contains("Operations:  3"))
        .stdout(predicate::str::contains("GET     /pets/{petId}"))
        .stdout(predicate::str::contains("bearerAuth"));
}

#[test]
fn test_check_json_contract() {
    driveby()
        .arg("check")
        .arg(fixture_path("insecure.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Open Widgets"));
}

#[test]
fn test_check_contract_without_operations() {
    driveby()
        .arg("check")
        .arg(fixture_path("invalid.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("no operations"));
}

#[test]
fn test_check_missing_file() {
    driveby()
        .arg("check")
        .arg("nonexistent.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// ============================================================================
// validate command tests
// ============================================================================

#[test]
fn test_validate_compliant_contract_passes() {
    driveby()
        .arg("validate")
        .arg(fixture_path("petstore.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("VALIDATION REPORT"))
        .stdout(predicate::str::contains("P001"))
        .stdout(predicate::str::contains("Validation PASSED"))
        .stdout(predicate::str::contains("Not run: phase not requested"));
}

#[test]
fn test_validate_missing_security_fails() {
    driveby()
        .arg("validate")
        .arg(fixture_path("insecure.json"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("P005"))
        .stdout(predicate::str::contains("No security schemes are declared"))
        .stdout(predicate::str::contains("Validation FAILED"));
}

#[test]
fn test_validate_json_output() {
    let report = stdout_json(
        driveby()
            .arg("validate")
            .arg("--format")
            .arg("json")
            .arg(fixture_path("petstore.yaml")),
    );

    assert_eq!(report["title"], "Petstore");
    assert_eq!(report["final_state"], "done");
    assert_eq!(report["rule_results"].as_array().map(Vec::len), Some(6));
    assert_eq!(report["functional"]["status"], "not_run");
    assert_eq!(report["summary"]["critical_issues"], 0);
}

#[test]
fn test_validate_auto_fix() {
    driveby()
        .arg("validate")
        .arg("--auto-fix")
        .arg(fixture_path("insecure.json"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Auto-fixes:"))
        .stdout(predicate::str::contains("(auto-fixed)"));
}

#[test]
fn test_validate_markdown_output() {
    driveby()
        .arg("validate")
        .arg("--format")
        .arg("markdown")
        .arg(fixture_path("petstore.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("# Validation Report: Petstore v1.2.0"))
        .stdout(predicate::str::contains("## Checks"));
}

// ============================================================================
// live command tests
// ============================================================================

#[test]
fn test_functional_against_unreachable_server() {
    let report = stdout_json(
        driveby()
            .arg("functional")
            .arg(fixture_path("petstore.yaml"))
            .arg("--base-url")
            .arg(DEAD_BASE_URL)
            .arg("--config")
            .arg(fixture_path("functional.yaml"))
            .arg("--format")
            .arg("json"),
    );

    let outcomes = report["functional"]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o["outcome"] == "failed"));
    assert_eq!(report["performance"]["reason"]["kind"], "not_requested");
    let failing = report["summary"]["failing_categories"].as_array().unwrap();
    assert!(failing.iter().any(|category| category == "Testing"));
}

#[test]
fn test_functional_exit_status_and_env_base_url() {
    driveby()
        .arg("functional")
        .arg(fixture_path("petstore.yaml"))
        .env("DRIVEBY_BASE_URL", DEAD_BASE_URL)
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed"))
        .stdout(predicate::str::contains("P006"));
}

#[test]
fn test_run_requires_base_url() {
    driveby()
        .arg("run")
        .arg(fixture_path("petstore.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No base URL"));
}

#[test]
fn test_run_rejects_invalid_config() {
    driveby()
        .arg("run")
        .arg(fixture_path("petstore.yaml"))
        .arg("--config")
        .arg(fixture_path("bad_rate.yaml"))
        .arg("--base-url")
        .arg(DEAD_BASE_URL)
        .assert()
        .failure()
        .stderr(predicate::str::contains("load.rate"));
}

#[test]
fn test_run_saves_reports() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("reports");

    driveby()
        .arg("run")
        .arg(fixture_path("petstore.yaml"))
        .arg("--config")
        .arg(fixture_path("rules_only.toml"))
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let json = fs::read_to_string(out.join("validation-report.json")).unwrap();
    let report: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["title"], "Petstore");
    assert_eq!(report["final_state"], "done");

    let markdown = fs::read_to_string(out.join("validation-report.md")).unwrap();
    assert!(markdown.contains("## Functional Testing"));
    assert!(markdown.contains("_Skipped: phase not requested_"));
}

#[test]
fn test_performance_rejects_bad_duration() {
    driveby()
        .arg("performance")
        .arg(fixture_path("petstore.yaml"))
        .arg("--base-url")
        .arg(DEAD_BASE_URL)
        .arg("--duration")
        .arg("soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("soon"));
}
