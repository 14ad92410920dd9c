//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gazenet(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gazenet").unwrap();
    cmd.current_dir(home.path().join("project"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"));
    cmd
}

fn home_with(xdg: Option<&str>, project: Option<&str>) -> TempDir {
    let home = TempDir::new().unwrap();
    let xdg_dir = home.path().join("config/gazenet");
    let project_dir = home.path().join("project");
    fs::create_dir_all(&xdg_dir).unwrap();
    fs::create_dir_all(&project_dir).unwrap();
    if let Some(content) = xdg {
        fs::write(xdg_dir.join("config.toml"), content).unwrap();
    }
    if let Some(content) = project {
        fs::write(project_dir.join(".gazenet.toml"), content).unwrap();
    }
    home
}

#[test]
fn test_xdg_config_applies() {
    let home = home_with(Some("[network]\ndepth = 13\n"), None);
    gazenet(&home)
        .arg("describe")
        .assert()
        .success()
        .stdout(predicate::str::contains("DenseNet depth 13"));
}

#[test]
fn test_project_config_overrides_xdg() {
    let home = home_with(
        Some("[network]\ndepth = 13\ngrowth_rate = 6\n"),
        Some("[network]\ndepth = 22\n"),
    );
    gazenet(&home)
        .arg("describe")
        .assert()
        .success()
        .stdout(predicate::str::contains("DenseNet depth 22 growth rate 6"));
}

#[test]
fn test_project_config_found_in_parent() {
    let home = home_with(None, Some("[output]\nformat = 'json'\n"));
    let nested = home.path().join("project/sub/dir");
    fs::create_dir_all(&nested).unwrap();

    gazenet(&home)
        .current_dir(&nested)
        .arg("describe")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_cli_overrides_project_config() {
    let home = home_with(None, Some("[network]\ndepth = 22\n\n[output]\nformat = 'json'\n"));
    gazenet(&home)
        .args(["describe", "--depth", "7", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DenseNet depth 7"));
}

#[test]
fn test_invalid_config_value_warns() {
    let home = home_with(None, Some("[output]\nformat = 'yaml'\n"));
    gazenet(&home)
        .arg("describe")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: output.format"));
}

#[test]
fn test_invalid_config_depth_fails_describe() {
    let home = home_with(None, Some("[network]\ndepth = 41\n"));
    gazenet(&home)
        .arg("describe")
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("warning: network")
                .and(predicate::str::contains("error: invalid network config")),
        );
}

#[test]
fn test_unparsable_config_is_skipped() {
    let home = home_with(Some("[network]\ndepth = 13\n"), Some("[network\ndepth = "));
    gazenet(&home)
        .args(["-v", "describe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DenseNet depth 13"))
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_config_input_size_applies() {
    let home = home_with(None, Some("[input]\nheight = 18\nwidth = 30\nchannels = 3\n"));
    gazenet(&home)
        .arg("describe")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("input      18x30x3")
                .and(predicate::str::contains("at 5x8 -> 2")),
        );
}
