//! The `save` binary: summary on stdout, JSON report, exit status.
#![cfg(unix)]

mod common;

use common::{Suite, ECHO_LINTER};

const CONFIG: &str = r#"
[general]
tags = "cli"

[warn]
execCmd = "sh lint.sh"
lineCaptureGroup = 1
columnCaptureGroup = 2
messageCaptureGroup = 3
"#;

#[test]
fn passing_suite_exits_zero_and_writes_report() {
    let suite = Suite::new();
    suite.config("", CONFIG);
    suite.tool("", "lint.sh", ECHO_LINTER);
    suite.file("ATest.kt", "// ;warn:1:1: a\n");
    let report_path = suite.root().join("out/report.json");

    let output = suite.run_cli(&["--report", report_path.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("[PASS] ATest.kt"));
    assert!(stdout.contains("1 passed, 0 failed, 0 errors"));

    let value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(report_path).unwrap()).unwrap();
    assert_eq!(value["results"][0]["status"]["status"], "pass");
}

#[test]
fn redirect_target_is_reset_then_collects_tool_output() {
    let suite = Suite::new();
    suite.config("", CONFIG);
    suite.tool("", "lint.sh", ECHO_LINTER);
    suite.file("ATest.kt", "// ;warn:1:1: a\n");
    let redirect = suite.file("tool.log", "stale line from a previous run\n");

    let output = suite.run_cli(&["--redirect-to", redirect.to_str().unwrap()]);
    assert!(output.status.success());
    let written = std::fs::read_to_string(&redirect).unwrap();
    assert!(!written.contains("stale line"), "log: {written}");
    assert!(written.contains("ATest.kt:1:1: a"), "log: {written}");
}

#[test]
fn broken_config_exits_non_zero() {
    let suite = Suite::new();
    suite.config("", "[general]\ntags = \"cli\"\n");
    suite.config("nested", "[general]\ntags = \"cli\"\nunknownKey = 1\n");

    let output = suite.run_cli(&[]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[ERROR] nested/save.toml"), "stdout: {stdout}");
}

#[test]
fn missing_root_config_is_a_hard_error() {
    let suite = Suite::new();
    let output = suite.run_cli(&[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("save.toml"));
}
