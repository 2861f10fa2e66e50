use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn prefs(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sealed-prefs").unwrap();
    cmd.env("SEALED_PREFS_DIR", dir.path())
        .env_remove("SEALED_PREFS_PASSPHRASE")
        .env_remove("SEALED_PREFS_NEW_PASSPHRASE")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_commands_require_init() {
    let dir = TempDir::new().unwrap();

    prefs(&dir)
        .args(["get", "session.token"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_set_get_list_remove() {
    let dir = TempDir::new().unwrap();

    prefs(&dir).arg("init").assert().success();
    assert!(dir.path().join("master.key").exists());

    prefs(&dir)
        .args(["set", "session.token", "abc123", "--raw"])
        .assert()
        .success();
    prefs(&dir).args(["set", "count", "42"]).assert().success();

    prefs(&dir)
        .args(["get", "session.token"])
        .assert()
        .success()
        .stdout("abc123\n");
    prefs(&dir)
        .args(["get", "count"])
        .assert()
        .success()
        .stdout("42\n");

    prefs(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout("count\nsession.token\n");

    let records = std::fs::read_to_string(dir.path().join("prefs.json")).unwrap();
    assert!(records.contains("session.token"));
    assert!(!records.contains("abc123"));

    prefs(&dir).args(["remove", "count"]).assert().success();
    prefs(&dir)
        .args(["get", "count"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No value stored"));
}

#[test]
fn test_invalid_json_value_rejected() {
    let dir = TempDir::new().unwrap();
    prefs(&dir).arg("init").assert().success();

    prefs(&dir)
        .args(["set", "name", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--raw"));
}

#[test]
fn test_tampered_record_reported() {
    let dir = TempDir::new().unwrap();
    prefs(&dir).arg("init").assert().success();
    prefs(&dir).args(["set", "flag", "true"]).assert().success();

    let path = dir.path().join("prefs.json");
    let mut document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let record = document["entries"]["flag"].as_str().unwrap().to_string();
    let mut chars: Vec<char> = record.chars().collect();
    chars[10] = if chars[10] == 'A' { 'B' } else { 'A' };
    document["entries"]["flag"] = serde_json::Value::String(chars.into_iter().collect());
    std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

    prefs(&dir)
        .args(["get", "flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Integrity check failed"));
}

#[test]
fn test_export_json() {
    let dir = TempDir::new().unwrap();
    prefs(&dir).arg("init").assert().success();
    prefs(&dir)
        .args(["set", "theme", r#"{"dark":true}"#])
        .assert()
        .success();

    let output = prefs(&dir).arg("export").output().unwrap();
    assert!(output.status.success());

    let export: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(export["entry_count"], 1);
    assert_eq!(export["entries"]["theme"]["dark"], true);
}

#[test]
fn test_passphrase_store() {
    let dir = TempDir::new().unwrap();

    prefs(&dir)
        .args(["init", "--passphrase"])
        .env("SEALED_PREFS_PASSPHRASE", "correct horse battery")
        .assert()
        .success();
    assert!(!dir.path().join("master.key").exists());

    prefs(&dir)
        .args(["set", "count", "7"])
        .env("SEALED_PREFS_PASSPHRASE", "correct horse battery")
        .assert()
        .success();

    prefs(&dir)
        .args(["get", "count"])
        .env("SEALED_PREFS_PASSPHRASE", "wrong passphrase")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incorrect passphrase"));

    prefs(&dir)
        .args(["get", "count"])
        .env("SEALED_PREFS_PASSPHRASE", "correct horse battery")
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn test_status_before_init() {
    let dir = TempDir::new().unwrap();

    prefs(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("NOT INITIALIZED"));
}

#[test]
fn test_parallel_sets_keep_every_key() {
    let dir = TempDir::new().unwrap();
    prefs(&dir).arg("init").assert().success();

    std::thread::scope(|scope| {
        for i in 0..8 {
            let dir = &dir;
            scope.spawn(move || {
                let key = format!("key{}", i);
                let value = i.to_string();
                prefs(dir)
                    .args(["set", key.as_str(), value.as_str()])
                    .assert()
                    .success();
            });
        }
    });

    let output = prefs(&dir).arg("list").output().unwrap();
    assert!(output.status.success());
    let listed = String::from_utf8(output.stdout).unwrap();
    assert_eq!(listed.lines().count(), 8);

    prefs(&dir)
        .args(["get", "key5"])
        .assert()
        .success()
        .stdout("5\n");
}

