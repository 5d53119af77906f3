//! Fixture paths and an isolated `swisscv` command for the binary tests

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// `tests/fixtures` of this crate
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Ages 20..=60, template summaries, json and csv output
pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

/// min_age above max_age and an out-of-range temperature
pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// Data directory with only ZH and GE
pub fn two_canton_data_dir() -> PathBuf {
    fixture_path("data")
}

/// Data directory whose cantons.json has a malformed row
pub fn bad_data_dir() -> PathBuf {
    fixture_path("bad_data")
}

/// A `swisscv` command isolated from the user's config and environment.
///
/// HOME points at `home`, so no user configuration is picked up, and
/// summaries use the offline template backend.
pub fn swisscv(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("swisscv").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("SWISSCV_SUMMARY_PROVIDER", "template")
        .env("SWISSCV_SUMMARY_CACHE_DIR", home.path().join("cache"))
        .env_remove("SWISSCV_CONFIG")
        .env_remove("SWISSCV_DATA_DIR")
        .env_remove("SWISSCV_OUTPUT_DIR")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}
