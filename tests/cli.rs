// パス: tests/cli.rs
// 役割: `primops` バイナリをエンドツーエンドで実行し出力と終了コードを検証する
// 意図: JSON 出力の形と、未対応操作・未登録名の扱いが利用者から見て安定していることを保証する
// 関連ファイル: src/cli.rs, src/bin/primops.rs
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;

fn primops_cli_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_primops"))
}

fn primops(args: &[&str]) -> Output {
    Command::new(primops_cli_path())
        .args(args)
        .env_remove("PRIMOPS_LOG")
        .output()
        .expect("spawn primops")
}

#[test]
fn list_json_reports_builtins() -> Result<(), Box<dyn std::error::Error>> {
    let output = primops(&["list", "--json"]);
    assert!(
        output.status.success(),
        "list failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["status"], "ok");
    let ops = json["ops"].as_array().expect("ops must be array");
    assert_eq!(json["count"].as_u64(), Some(ops.len() as u64));
    let add = ops
        .iter()
        .find(|entry| entry["name"] == "aten::add")
        .expect("aten::add missing in CLI JSON");
    assert_eq!(add["arity"], 2);
    let list = ops
        .iter()
        .find(|entry| entry["name"] == "prim::ListConstruct")
        .expect("prim::ListConstruct missing in CLI JSON");
    assert!(list["arity"].is_null());
    Ok(())
}

#[test]
fn list_plain_is_sorted() {
    let output = primops(&["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout.lines().collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert!(names.contains(&"aten::add"));
}

#[test]
fn has_sets_exit_code() {
    let found = primops(&["has", "aten::add"]);
    assert_eq!(found.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&found.stdout).trim(), "true");

    let missing = primops(&["has", "aten::sub2"]);
    assert_eq!(missing.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&missing.stdout).trim(), "false");
}

#[test]
fn run_json_prints_final_stack() -> Result<(), Box<dyn std::error::Error>> {
    let output = primops(&["run", "--json", "3", "4", "aten::add"]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["stack"][0]["type"], "Int");
    assert_eq!(json["stack"][0]["value"], 7);
    Ok(())
}

#[test]
fn run_plain_accepts_negative_numbers() {
    let output = primops(&["run", "-2", "5", "aten::mul"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[-10]");
}

#[test]
fn run_unsupported_operation_fails_with_code() -> Result<(), Box<dyn std::error::Error>> {
    let plain = primops(&["run", "1", "aten::conv2d"]);
    assert_eq!(plain.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&plain.stderr);
    assert!(stderr.contains("[EXEC001]"), "{stderr}");

    let json = primops(&["run", "--json", "1", "aten::conv2d"]);
    assert_eq!(json.status.code(), Some(2));
    let report: Value = serde_json::from_slice(&json.stdout)?;
    assert_eq!(report["status"], "error");
    assert_eq!(report["code"], "EXEC001");
    Ok(())
}
