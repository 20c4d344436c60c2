use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const NEW_ORDER: &str = "From: Shop <noreply@cyberbiz.co>\r\n\
Subject: =?UTF-8?B?5oKo5pyJ5LiA562G5paw6KiC5ZauIOioguWWrue3qOiZnzogQzIwMjYwMTAxMDAx?=\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><body>\r\n\
<p>訂單日期：2026-01-01</p>\r\n\
<p>收件人：王小明</p>\r\n\
<table>\r\n\
<tr><th>商品</th><th>數量</th><th>金額</th></tr>\r\n\
<tr><td>能量膠 - 柑橘口味</td><td>3</td><td>NT$450</td></tr>\r\n\
<tr><td>電解質粉 - 檸檬口味</td><td>1</td><td>NT$350</td></tr>\r\n\
</table>\r\n\
<p>總計：NT$760</p>\r\n\
</body></html>\r\n";

const NOTICE: &str = r#"{"id": "n1", "subject": "一般通知信件 訂單", "from": "noreply@cyberbiz.co", "body": "<p>Hello</p>"}"#;

fn ordersync() -> Command {
    Command::cargo_bin("ordersync").unwrap()
}

fn mailbox(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("order.eml"), NEW_ORDER).unwrap();
    fs::write(dir.join("notice.json"), NOTICE).unwrap();
}

fn empty_config(dir: &Path) -> String {
    let path = dir.join("config.json");
    fs::write(&path, "{}").unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_parse_json_output() {
    let dir = tempfile::tempdir().unwrap();
    mailbox(&dir.path().join("mail"));
    let config = empty_config(dir.path());

    ordersync()
        .args(["--config", &config, "parse"])
        .arg(dir.path().join("mail"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"order_number\": \"C20260101001\""))
        .stdout(predicate::str::contains("能量膠"))
        .stderr(predicate::str::contains("Parsed 1 orders from 2 emails"))
        .stderr(predicate::str::contains("1 emails failed to parse"));
}

#[test]
fn test_parse_csv_one_row_per_item() {
    let dir = tempfile::tempdir().unwrap();
    mailbox(&dir.path().join("mail"));
    let config = empty_config(dir.path());
    let output = dir.path().join("orders.csv");

    ordersync()
        .args(["--config", &config, "parse", "--format", "csv", "--output"])
        .arg(&output)
        .arg(dir.path().join("mail").join("order.eml"))
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("order_number,order_date"));
    assert!(lines[1].starts_with("C20260101001,2026-01-01"));
}

#[test]
fn test_parse_missing_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());

    ordersync()
        .args(["--config", &config, "parse"])
        .arg(dir.path().join("nothing-*.eml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No message files found"));
}

#[test]
fn test_sync_writes_ledger_once() {
    let dir = tempfile::tempdir().unwrap();
    let mail = dir.path().join("mail");
    mailbox(&mail);
    let config = empty_config(dir.path());
    let ledger = dir.path().join("ledger.csv");

    let sync = || {
        let mut cmd = ordersync();
        cmd.args(["--config", &config, "sync", "--days", "36500", "--mailbox"])
            .arg(&mail)
            .arg("--ledger")
            .arg(&ledger);
        cmd
    };

    sync()
        .assert()
        .success()
        .stdout(predicate::str::contains("1 new orders (2 rows)"));

    let content = fs::read_to_string(&ledger).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("訂單日期,訂單編號"));
    assert!(lines[1].contains("C20260101001"));
    assert!(lines[1].contains("Gmail 自動匯入"));

    sync()
        .assert()
        .success()
        .stdout(predicate::str::contains("0 new orders (0 rows)"));
    assert_eq!(fs::read_to_string(&ledger).unwrap(), content);
}

#[test]
fn test_sync_dry_run_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let mail = dir.path().join("mail");
    mailbox(&mail);
    let config = empty_config(dir.path());
    let ledger = dir.path().join("ledger.csv");

    ordersync()
        .args(["--config", &config, "sync", "--dry-run", "--json", "--days", "36500"])
        .arg("--mailbox")
        .arg(&mail)
        .arg("--ledger")
        .arg(&ledger)
        .arg("--schema")
        .arg("single-row")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"appended_rows\":1"))
        .stdout(predicate::str::contains("\"dry_run\":true"));

    assert!(!ledger.exists());
}

#[test]
fn test_config_init_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf").join("config.json");
    let config = path.to_string_lossy().into_owned();

    ordersync()
        .args(["--config", &config, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(path.exists());

    ordersync()
        .args(["--config", &config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    ordersync()
        .args(["--config", &config, "config", "set", "ledger.schema", "single_row"])
        .assert()
        .success();

    ordersync()
        .args(["--config", &config, "config", "get", "ledger.schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"single_row\""));

    ordersync()
        .args(["--config", &config, "config", "set", "ledger.nonexistent", "1"])
        .assert()
        .failure();

    ordersync()
        .args(["--config", &config, "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));
}
