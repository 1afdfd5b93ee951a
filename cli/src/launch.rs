//! Building the analysis tool's command line.

use std::path::Path;

use anyhow::{Result, bail};
use tokio::process::Command;

/// Argument placeholder replaced with the run's feedback directory.
pub const PLACEHOLDER: &str = "$feedback";

/// Environment variable carrying the feedback directory to the tool.
pub const FEEDBACK_ENV: &str = "VERITY_FEEDBACK_DIR";

/// Expand `$feedback` in the tool's arguments.
///
/// An argument that is exactly the placeholder becomes `--feedback <dir>`;
/// one that merely contains it gets the directory spliced in.
pub fn expand_args(args: &[String], dir: &Path) -> Vec<String> {
    let dir = dir.display().to_string();
    let mut out = Vec::with_capacity(args.len() + 1);
    for arg in args {
        if arg == PLACEHOLDER {
            out.push("--feedback".to_string());
            out.push(dir.clone());
        } else {
            out.push(arg.replace(PLACEHOLDER, &dir));
        }
    }
    out
}

/// Command for `argv` (program first) writing its results into `dir`.
pub fn command(argv: &[String], dir: &Path) -> Result<Command> {
    let Some((program, args)) = argv.split_first() else {
        bail!("no program to run");
    };
    let mut cmd = Command::new(program);
    cmd.args(expand_args(args, dir))
        .env(FEEDBACK_ENV, dir)
        .kill_on_drop(true);
    Ok(cmd)
}
