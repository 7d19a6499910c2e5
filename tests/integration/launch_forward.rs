use anyhow::Result;
use serde_json::Value;
use tempfile::tempdir;
use uuid::Uuid;

use crate::common::{fixture, run_launcher, stderr_of, stdout_of, write_shell_config};

#[test]
fn dry_run_prints_forward_request_once() -> Result<()> {
    let cwd = tempdir()?;
    let config = fixture("tests/fixtures/launcher_dry_run.toml");
    let output = run_launcher(
        cwd.path(),
        &[
            "--config",
            &config,
            "--dry-run",
            "--input",
            "a.trace",
            "--multithread",
        ],
    )?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    let payload: Value = serde_json::from_str(&stdout_of(&output))?;
    assert_eq!(payload["status"], "forwarded");
    assert_eq!(payload["target"], "RetraceActivity");
    assert_eq!(payload["key"], "fastforward");
    assert!(payload["issued_at"].is_string());
    let activation_id = payload["activation_id"]
        .as_str()
        .expect("activation_id should be a string");
    Uuid::parse_str(activation_id)?;
    let args = payload["args"].as_str().expect("args should be a string");
    assert!(args.starts_with("--input a.trace --multithread "), "{args}");
    Ok(())
}

#[test]
fn wait_passes_rendered_string_as_single_argument() -> Result<()> {
    let cwd = tempdir()?;
    let config = write_shell_config(
        cwd.path(),
        r#"[ "$#" -eq 2 ] && [ "$1" = "--fastforward" ] && case "$2" in "--input a.trace --endFrame 9 "*) exit 0 ;; *) exit 4 ;; esac"#,
        false,
    )?;
    let output = run_launcher(
        cwd.path(),
        &[
            "--config",
            &config.display().to_string(),
            "--wait",
            "--input",
            "a.trace",
            "--endFrame",
            "9",
        ],
    )?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    Ok(())
}

#[test]
fn wait_propagates_replay_program_status() -> Result<()> {
    let cwd = tempdir()?;
    write_shell_config(cwd.path(), "exit 3", false)?;
    // Picks up ./fastforward.toml without --config.
    let output = run_launcher(cwd.path(), &["--wait"])?;

    assert_eq!(output.status.code(), Some(3), "{}", stderr_of(&output));
    Ok(())
}

#[test]
fn forced_exit_still_reports_replay_program_status() -> Result<()> {
    let cwd = tempdir()?;
    let config = write_shell_config(cwd.path(), "exit 5", true)?;
    let output = run_launcher(
        cwd.path(),
        &["--config", &config.display().to_string(), "--wait"],
    )?;

    let stderr = stderr_of(&output);
    assert_eq!(output.status.code(), Some(5), "{stderr}");
    assert!(
        stderr.contains("replay program exited with status 5"),
        "{stderr}"
    );
    assert!(stderr.contains("Forcing launcher exit"), "{stderr}");
    Ok(())
}

#[test]
fn missing_program_fails_with_forward_status() -> Result<()> {
    let cwd = tempdir()?;
    let config = fixture("tests/fixtures/launcher_dry_run.toml");
    let output = run_launcher(cwd.path(), &["--config", &config])?;

    assert_eq!(output.status.code(), Some(69), "{}", stderr_of(&output));
    assert!(stderr_of(&output).contains("FORWARD_FAILED"));
    Ok(())
}

#[test]
fn missing_explicit_config_fails_with_config_status() -> Result<()> {
    let cwd = tempdir()?;
    let absent = cwd.path().join("absent.toml");
    let output = run_launcher(
        cwd.path(),
        &["--config", &absent.display().to_string(), "--dry-run"],
    )?;

    assert_eq!(output.status.code(), Some(78), "{}", stderr_of(&output));
    assert!(stdout_of(&output).is_empty());
    Ok(())
}

#[test]
fn invalid_config_fails_with_config_status() -> Result<()> {
    let cwd = tempdir()?;
    let config = fixture("tests/fixtures/launcher_invalid_delay.toml");
    let output = run_launcher(cwd.path(), &["--config", &config, "--dry-run"])?;

    assert_eq!(output.status.code(), Some(78), "{}", stderr_of(&output));
    Ok(())
}

#[test]
fn bad_param_file_forwards_nothing() -> Result<()> {
    let cwd = tempdir()?;
    let config = fixture("tests/fixtures/launcher_dry_run.toml");
    let params = fixture("tests/fixtures/params_truncated.json");
    let output = run_launcher(
        cwd.path(),
        &["--config", &config, "--dry-run", "--jsonData", &params],
    )?;

    assert_eq!(output.status.code(), Some(65), "{}", stderr_of(&output));
    assert!(stdout_of(&output).is_empty());
    Ok(())
}

#[test]
fn wait_and_dry_run_are_mutually_exclusive() -> Result<()> {
    let cwd = tempdir()?;
    let output = run_launcher(cwd.path(), &["--dry-run", "--wait"])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}
