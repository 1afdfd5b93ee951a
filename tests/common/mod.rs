//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// The built `verity` binary.
pub fn verity() -> Command {
    Command::new(env!("CARGO_BIN_EXE_verity"))
}

/// A proof-state result anchored at `line` of `/work/a.sc`.
pub fn state_json(line: u32, claims: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "Logika.Verify.State",
        "posOpt": {
            "type": "Some",
            "value": {
                "uriOpt": { "type": "Some", "value": "file:///work/a.sc" },
                "beginLine": line,
                "beginColumn": 1,
                "endLine": line,
                "endColumn": 1
            }
        },
        "claims": claims
    })
}

/// Write a config file under `dir` whose feedback root is `dir/runs`.
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let body = format!(
        "[feedback]\nroot = \"{}\"\ncase_insensitive_paths = false\n\n{extra}",
        dir.join("runs").display()
    );
    std::fs::write(&path, body).expect("write config");
    path
}

/// Entries left under the feedback root.
pub fn leftover_runs(dir: &Path) -> usize {
    std::fs::read_dir(dir.join("runs")).map_or(0, Iterator::count)
}
