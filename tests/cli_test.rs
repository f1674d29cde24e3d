use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn poslauncher() -> Result<Command> {
    let mut cmd = Command::cargo_bin("poslauncher")?;
    cmd.env_remove("POSLAUNCHER_CONFIG");
    Ok(cmd)
}

#[test]
fn test_version_command() -> Result<()> {
    poslauncher()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("poslauncher 0.1.0"));
    Ok(())
}

#[test]
fn test_version_subcommand() -> Result<()> {
    poslauncher()?
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("poslauncher 0.1.0"));
    Ok(())
}

#[test]
fn test_help_command() -> Result<()> {
    poslauncher()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Starts the services a point-of-sale client needs",
        ))
        .stdout(predicate::str::contains("discover"));
    Ok(())
}

#[test]
fn test_config_path_honours_flag() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.toml");

    poslauncher()?
        .arg("--config")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
    Ok(())
}

#[test]
fn test_config_show_creates_defaults() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.toml");

    poslauncher()?
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("service_start_timeout_seconds = 30"))
        .stdout(predicate::str::contains("auto_start_on_boot = true"));

    assert!(path.exists());
    Ok(())
}

#[test]
fn test_config_set_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.toml");

    poslauncher()?
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "client_arguments", "--store 12"])
        .assert()
        .success();

    poslauncher()?
        .env("POSLAUNCHER_CONFIG", &path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("client_arguments = \"--store 12\""));
    Ok(())
}

#[test]
fn test_config_set_rejects_unknown_key() -> Result<()> {
    let dir = tempdir()?;

    poslauncher()?
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["config", "set", "colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
    Ok(())
}

#[test]
fn test_config_set_rejects_zero_timeout() -> Result<()> {
    let dir = tempdir()?;

    poslauncher()?
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["config", "set", "service_start_timeout_seconds", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
    Ok(())
}
