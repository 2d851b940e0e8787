//! Build identification for the lyra-ai startup banner
//!
//! `GIT_HASH` comes from `git describe`, so an edited tree shows `-dirty`.
//! `BUILD_TIMESTAMP` is UTC and honours `SOURCE_DATE_EPOCH` for reproducible
//! builds. `BUILD_PROFILE` is the cargo profile.

use chrono::{DateTime, SecondsFormat, Utc};
use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

/// Trimmed stdout of a successful command
fn stdout_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn build_time() -> DateTime<Utc> {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

fn main() {
    let describe = stdout_of("git", &["describe", "--always", "--dirty", "--abbrev=8"]);
    let timestamp = build_time().to_rfc3339_opts(SecondsFormat::Secs, true);
    let profile = env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string());

    println!(
        "cargo:rustc-env=GIT_HASH={}",
        describe.as_deref().unwrap_or(UNKNOWN)
    );
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // Refresh on new commits or staging, not on every build
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/index");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
}
