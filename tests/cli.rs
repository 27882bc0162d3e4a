use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bankflow(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bankflow").unwrap();
    cmd.env("BANKFLOW_CONFIG_DIR", config_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_no_command_shows_guidance() {
    let dir = TempDir::new().unwrap();

    bankflow(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("bankflow joint"))
        .stdout(predicate::str::contains("bankflow pay"));
}

#[test]
fn test_config_init_writes_settings() {
    let dir = TempDir::new().unwrap();

    bankflow(&dir)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote settings to"))
        .stdout(predicate::str::contains("Reference max length: 50"));

    assert!(dir.path().join("config.json").exists());
}

#[test]
fn test_custom_settings_are_used() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{ "currency_symbol": "$" }"#,
    )
    .unwrap();

    bankflow(&dir)
        .arg("pay")
        .write_stdin("1\n1\n50\n\ny\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("payment of $50.00 to John Doe (Savings)"));
}

#[test]
fn test_invalid_settings_fail() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    bankflow(&dir)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse settings file"));
}

#[test]
fn test_pay_happy_path() {
    let dir = TempDir::new().unwrap();

    bankflow(&dir)
        .arg("pay")
        .write_stdin("1\n1\n50\nRent\ny\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reference:"))
        .stdout(predicate::str::contains("Rent"))
        .stdout(predicate::str::contains(
            "You are about to authorize a payment of £50.00 to John Doe (Savings). This action cannot be undone.",
        ))
        .stdout(predicate::str::contains("Payment sent. Confirmation: cnf-"));
}

#[test]
fn test_pay_with_failure_writes_audit() {
    let dir = TempDir::new().unwrap();
    let audit = dir.path().join("audit.jsonl");

    bankflow(&dir)
        .args(["pay", "--fail-first", "1", "--audit"])
        .arg(&audit)
        .write_stdin("1\n1\n50\n\ny\ny\ny\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Payment failed"))
        .stdout(predicate::str::contains("Payment sent."));

    let contents = std::fs::read_to_string(audit).unwrap();
    assert!(contents.contains("\"outcome\":\"rejected\""));
}

#[test]
fn test_closed_input_fails() {
    let dir = TempDir::new().unwrap();

    bankflow(&dir)
        .arg("pay")
        .write_stdin("1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input closed"));
}

#[test]
fn test_joint_application() {
    let dir = TempDir::new().unwrap();

    bankflow(&dir)
        .arg("joint")
        .write_stdin(
            "Jane Doe\njane@example.com\n07700 900123\n\
             John Smith\njohn@example.com\n\
             y\n\
             y\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 3 of 3: Review & Confirm"))
        .stdout(predicate::str::contains("Application submitted."));
}
