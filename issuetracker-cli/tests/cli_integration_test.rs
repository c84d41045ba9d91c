//! Integration tests for the issuetracker binary

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn issuetracker() -> Result<Command> {
    let mut cmd = Command::cargo_bin("issuetracker")?;
    // Keep the developer's environment out of config resolution
    for key in ["HOST", "PORT", "STORAGE", "DATA_DIR", "MAX_BODY_BYTES"] {
        cmd.env_remove(format!("ISSUETRACKER_{}", key));
    }
    Ok(cmd)
}

#[test]
fn test_no_subcommand_prints_help() -> Result<()> {
    issuetracker()?
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("completion"));
    Ok(())
}

#[test]
fn test_serve_help_documents_exit_codes() -> Result<()> {
    issuetracker()?
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--storage"))
        .stdout(predicate::str::contains("2 - Invalid configuration"));
    Ok(())
}

#[test]
fn test_completion_bash() -> Result<()> {
    issuetracker()?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("issuetracker"));
    Ok(())
}

#[test]
fn test_config_example() -> Result<()> {
    issuetracker()?
        .args(["config", "--example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_body_bytes: 1048576"))
        .stdout(predicate::str::contains("storage: memory"));
    Ok(())
}

#[test]
fn test_config_shows_file_and_env_values() -> Result<()> {
    let temp = TempDir::new()?;
    let file = temp.path().join("issuetracker.yaml");
    fs::write(&file, "port: 8123\n")?;

    issuetracker()?
        .current_dir(temp.path())
        .env("ISSUETRACKER_STORAGE", "filesystem")
        .args(["config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 8123"))
        .stdout(predicate::str::contains("storage: filesystem"));
    Ok(())
}

#[test]
fn test_serve_with_invalid_config_exits_2() -> Result<()> {
    let temp = TempDir::new()?;
    let file = temp.path().join("bad.yaml");
    fs::write(&file, "max_body_bytes: 0\n")?;

    issuetracker()?
        .args(["serve", "--config"])
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("max_body_bytes"));
    Ok(())
}

#[test]
fn test_serve_with_missing_config_file_exits_2() -> Result<()> {
    let temp = TempDir::new()?;

    issuetracker()?
        .args(["serve", "--config"])
        .arg(temp.path().join("absent.yaml"))
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn test_serve_on_occupied_port_exits_1() -> Result<()> {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = occupied.local_addr()?.port().to_string();

    issuetracker()?
        .args(["serve", "--host", "127.0.0.1", "--port", &port])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to bind"));
    Ok(())
}

#[test]
fn test_unknown_storage_is_rejected_by_parser() -> Result<()> {
    issuetracker()?
        .args(["serve", "--storage", "mongo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
    Ok(())
}
