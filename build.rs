//! Build script for swisscv
//!
//! Embeds build metadata (git revision, timestamp, target, compiler) so that
//! generated persona batches can be traced back to the binary that produced them.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_hash = command_output("git", &["rev-parse", "--short=8", "HEAD"]);
    let git_branch = command_output("git", &["rev-parse", "--abbrev-ref", "HEAD"]);
    let git_dirty = git_dirty_flag();
    let rustc_version = command_output("rustc", &["--version"]);

    let build_timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let host = env::var("HOST").unwrap_or_else(|_| "unknown".to_string());

    let vars = [
        ("SWISSCV_GIT_HASH", git_hash.as_str()),
        ("SWISSCV_GIT_BRANCH", git_branch.as_str()),
        ("SWISSCV_GIT_DIRTY", git_dirty),
        ("SWISSCV_BUILD_TIMESTAMP", build_timestamp.as_str()),
        ("SWISSCV_TARGET", target.as_str()),
        ("SWISSCV_PROFILE", profile.as_str()),
        ("SWISSCV_RUSTC_VERSION", rustc_version.as_str()),
        ("SWISSCV_HOST", host.as_str()),
    ];
    for (key, value) in vars {
        println!("cargo:rustc-env={}={}", key, value);
    }
}

/// Run a command and return its trimmed stdout, or "unknown"
fn command_output(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// "true" when the working tree has uncommitted changes
fn git_dirty_flag() -> &'static str {
    match Command::new("git").args(["status", "--porcelain"]).output() {
        Ok(output) if output.status.success() => {
            if output.stdout.is_empty() {
                "false"
            } else {
                "true"
            }
        }
        _ => "unknown",
    }
}
