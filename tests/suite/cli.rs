//! End-to-end runs of the `verity` binary

use crate::common::{leftover_runs, state_json, verity, write_config};

#[test]
fn decode_prints_event_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("r.json");
    std::fs::write(&file, serde_json::to_vec(&state_json(10, "x > 0")).unwrap()).unwrap();

    let output = verity().arg("decode").arg(&file).output().unwrap();
    assert!(output.status.success());

    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(event["category"], "proof-state");
    assert_eq!(event["claims"], "x > 0");
    assert_eq!(event["location"]["document"], "file:///work/a.sc");
    assert_eq!(event["location"]["position"]["beginLine"], 10);
}

#[test]
fn decode_fails_on_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("r.json");
    std::fs::write(&file, b"{\"type\": ").unwrap();

    let output = verity().arg("decode").arg(&file).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

/// The tool writes next to the run directory and moves the result in, then
/// lingers briefly before exiting with `code`.
#[cfg(unix)]
fn tool_script(dir_expr: &str, code: i32) -> String {
    format!(
        "d={dir_expr}; printf '%s' \"$RESULT_JSON\" > \"$d.tmp\" && mv \"$d.tmp\" \"$d/r.json\"; sleep 0.3; exit {code}"
    )
}

#[cfg(unix)]
#[test]
fn run_reports_annotations_and_propagates_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = verity()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--open", "/work/a.sc", "--", "sh", "-c"])
        .arg(tool_script("\"$2\"", 3))
        .args(["sh", "$feedback"])
        .env("RESULT_JSON", state_json(10, "x > 0").to_string())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        "/work/a.sc:10: [proof-state] x > 0\nerror: Ill-formed program\n"
    );
    assert_eq!(leftover_runs(dir.path()), 0);
}

#[cfg(unix)]
#[test]
fn run_exports_feedback_directory_and_custom_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[summary]\nsuccess = \"All proofs checked\"\n");

    let output = verity()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--open", "/work/a.sc", "--", "sh", "-c"])
        .arg(tool_script("\"$VERITY_FEEDBACK_DIR\"", 0))
        .env("RESULT_JSON", state_json(2, "y").to_string())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "/work/a.sc:2: [proof-state] y\ninfo: All proofs checked\n");
}

#[test]
fn run_with_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = verity()
        .arg("run")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .args(["--", "true"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"));
}
