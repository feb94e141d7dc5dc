// crates/loadgate-cli/tests/cli_command.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for the loadgate binary.
// Purpose: Verify exit codes, verdict records, and listing output end to end.
// Dependencies: loadgate binary, serde_json, tempfile, tiny_http
// ============================================================================
//! ## Overview
//! Drives the compiled `loadgate` binary against temporary config files and a
//! scripted loopback service. Exit codes are the contract CI pipelines gate
//! on, so each verdict path is checked through the process boundary.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::thread;
use std::thread::JoinHandle;

use serde_json::Value;
use tempfile::NamedTempFile;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const KEY: &str = "aaaa1111111111bbbbbb";

fn loadgate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_loadgate"))
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

fn service_config(base_url: &str, error_rate_fail: i64) -> String {
    format!(
        "[service]\nbase_url = \"{base_url}\"\nallow_http = true\ntimeout_ms = 5000\n\n\
         [[credentials.keys]]\napi_key = \"{KEY}\"\ndescription = \"ci\"\n\n\
         [gate]\ntest_id = \"abc123\"\n\n\
         [gate.thresholds]\nerror_rate_fail = {error_rate_fail}\nerror_rate_warn = 2\n\
         latency_fail_ms = 1000\nlatency_warn_ms = 500\n\n\
         [polling]\ninterval_sec = 1\nsettle_delay_sec = 0\n"
    )
}

fn loadgate(config: &Path, args: &[&str]) -> Output {
    Command::new(loadgate_bin())
        .env_remove("LOADGATE_CONFIG")
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("run loadgate")
}

fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
    let server = Server::http("127.0.0.1:0").expect("bind server");
    let addr = server.server_addr().to_ip().expect("ip addr");
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let Ok(request) = server.recv() else {
                break;
            };
            seen.push(format!("{} {}", request.method(), request.url()));
            let _ = request.respond(Response::from_string(body).with_status_code(status));
        }
        seen
    });
    (format!("http://{addr}/v2"), handle)
}

fn completed_run(error_rate: f64) -> Vec<(u16, String)> {
    vec![
        (200, r#"{"run_id":"r1"}"#.to_string()),
        (200, r#"{"status":"complete","duration":60}"#.to_string()),
        (200, format!(r#"{{"avg_response_time":100,"avg_error_rate":{error_rate}}}"#)),
    ]
}

fn stdout_record(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().last().expect("record line");
    serde_json::from_str(line).expect("record json")
}

// ============================================================================
// SECTION: Config and Credentials
// ============================================================================

#[test]
fn config_validate_accepts_valid_file() {
    let config = write_config(&service_config("http://127.0.0.1:1/v2", 5));
    let output = loadgate(config.path(), &["config", "validate"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("config ok"));
}

#[test]
fn config_validate_reports_threshold_issues() {
    let config = write_config("[gate.thresholds]\nerror_rate_fail = 101\n");
    let output = loadgate(config.path(), &["config", "validate"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error_rate_fail"));
}

#[test]
fn credentials_list_deduplicates_by_identifier() {
    let config = write_config(&format!(
        "[[credentials.keys]]\napi_key = \"{KEY}\"\ndescription = \"first\"\n\
         [[credentials.keys]]\napi_key = \"{KEY}\"\ndescription = \"second\"\n"
    ));
    let output = loadgate(config.path(), &["credentials", "list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1, "unexpected output: {stdout}");
    assert!(stdout.contains("aaaa...bbbbbb"));
    assert!(!stdout.contains(KEY));
}

#[test]
fn credentials_list_reports_empty_store() {
    let config = write_config("");
    let output = loadgate(config.path(), &["credentials", "list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no credentials configured"));
}

// ============================================================================
// SECTION: Run
// ============================================================================

#[test]
fn run_with_invalid_thresholds_is_not_built() {
    let config = write_config(&service_config("http://127.0.0.1:1/v2", 101));
    let output = loadgate(config.path(), &["run"]);
    assert_eq!(output.status.code(), Some(3));
    let record = stdout_record(&output);
    assert_eq!(record["verdict"], "not_built");
    assert!(record["reason"].as_str().unwrap_or_default().contains("error_rate_fail"));
}

#[test]
fn run_with_missing_config_is_not_built() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = loadgate(&dir.path().join("absent.toml"), &["run"]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stdout_record(&output)["verdict"], "not_built");
    assert!(String::from_utf8_lossy(&output.stderr).contains("stage.failed"));
}

#[test]
fn run_passes_within_thresholds() {
    let (base_url, server) = serve(completed_run(0.5));
    let config = write_config(&service_config(&base_url, 5));
    let output = loadgate(config.path(), &["run"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let record = stdout_record(&output);
    assert_eq!(record["verdict"], "pass");
    assert_eq!(record["report"]["run_id"], "r1");
    let seen = server.join().expect("server thread");
    assert_eq!(
        seen,
        vec![
            "POST /v2/tests/abc123/run".to_string(),
            "GET /v2/tests/abc123/runs/r1".to_string(),
            "GET /v2/tests/abc123/runs/r1/summary".to_string(),
        ]
    );
}

#[test]
fn run_fails_over_error_rate_threshold() {
    let (base_url, _server) = serve(completed_run(5.1));
    let config = write_config(&service_config(&base_url, 5));
    let output = loadgate(config.path(), &["run"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_record(&output)["verdict"], "fail");
}

#[test]
fn run_writes_record_and_log_files() {
    let (base_url, _server) = serve(completed_run(0.5));
    let config = write_config(&service_config(&base_url, 5));
    let dir = tempfile::tempdir().expect("temp dir");
    let record_path = dir.path().join("record.jsonl");
    let log_path = dir.path().join("log.jsonl");
    let output = loadgate(
        config.path(),
        &[
            "run",
            "--record",
            record_path.to_str().expect("utf-8 path"),
            "--log",
            log_path.to_str().expect("utf-8 path"),
        ],
    );
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    let record = std::fs::read_to_string(&record_path).expect("record file");
    assert!(record.contains("\"pass\""));
    let log = std::fs::read_to_string(&log_path).expect("log file");
    assert!(log.contains("gate.verdict"));
    assert!(!log.contains(KEY));
}

#[cfg(unix)]
#[test]
fn interrupt_during_poll_records_not_built() {
    use std::process::Stdio;
    use std::sync::mpsc;
    use std::time::Duration;

    let server = Server::http("127.0.0.1:0").expect("bind server");
    let addr = server.server_addr().to_ip().expect("ip addr");
    let (polled_tx, polled_rx) = mpsc::channel();
    thread::spawn(move || {
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(10)) {
            let body = if request.url().ends_with("/run") {
                r#"{"run_id":"r1"}"#
            } else {
                let _ = polled_tx.send(());
                r#"{"status":"running","duration":0}"#
            };
            let _ = request.respond(Response::from_string(body).with_status_code(200));
        }
    });
    let config = write_config(&service_config(&format!("http://{addr}/v2"), 5));
    let child = Command::new(loadgate_bin())
        .env_remove("LOADGATE_CONFIG")
        .arg("--config")
        .arg(config.path())
        .arg("run")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn loadgate");

    polled_rx.recv_timeout(Duration::from_secs(10)).expect("first status fetch");
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("send interrupt");
    assert!(status.success());

    let output = child.wait_with_output().expect("wait loadgate");
    assert_eq!(output.status.code(), Some(3));
    let record = stdout_record(&output);
    assert_eq!(record["verdict"], "not_built");
    assert_eq!(record["report"]["run_id"], "r1");
    assert!(record["reason"].as_str().unwrap_or_default().contains("cancelled"));
}

// ============================================================================
// SECTION: Tests Listing
// ============================================================================

#[test]
fn tests_list_prints_sorted_tests() {
    let (base_url, _server) = serve(vec![(200, r#"{"zz9":"Checkout","abc123":"Homepage"}"#.to_string())]);
    let config = write_config(&service_config(&base_url, 5));
    let output = loadgate(config.path(), &["tests", "list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["abc123  Homepage", "zz9  Checkout"]);
}

#[test]
fn tests_list_reports_invalid_key() {
    let (base_url, _server) = serve(vec![(401, "{}".to_string())]);
    let config = write_config(&service_config(&base_url, 5));
    let output = loadgate(config.path(), &["tests", "list"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid API key"));
}
