use anyhow::Result;
use serde_json::Value;
use tempfile::tempdir;

use crate::common::{fixture, run_launcher, stderr_of, stdout_of};

const DEFAULT_TOGGLES: &str = "--removeUnusedShader 1 --removeUnusedMipmap 1 \
--removeUnusedBuffer 1 --norestoreUnusedBuffer 1 --removeBufferSubData 1 ";

#[test]
fn render_without_params_prints_default_toggles() -> Result<()> {
    let cwd = tempdir()?;
    let output = run_launcher(cwd.path(), &["render"])?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(stdout_of(&output), format!("{DEFAULT_TOGGLES}\n"));
    Ok(())
}

#[test]
fn render_merges_param_file_under_activation_flags() -> Result<()> {
    let cwd = tempdir()?;
    let params = fixture("tests/fixtures/params_partial.json");
    let output = run_launcher(
        cwd.path(),
        &[
            "--input",
            "a.trace",
            "--targetFrame",
            "5",
            "--jsonData",
            &params,
            "render",
        ],
    )?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    assert_eq!(
        stdout_of(&output),
        "--input a.trace --output b.trace --targetFrame 5 --noscreen \
--removeUnusedShader 1 --removeUnusedMipmap 1 --removeUnusedBuffer 0 \
--norestoreUnusedBuffer 1 --removeBufferSubData 1 \n"
    );
    Ok(())
}

#[test]
fn render_accepts_inline_json_and_explicit_booleans() -> Result<()> {
    let cwd = tempdir()?;
    let output = run_launcher(
        cwd.path(),
        &[
            "--removeUnusedShader=false",
            "--offscreen",
            "--jsonData",
            r#"{"removeUnusedShader": true, "restorefbo0": 2}"#,
            "render",
        ],
    )?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(
        stdout.starts_with("--offscreen --restorefbo0 2 "),
        "{stdout}"
    );
    assert!(stdout.contains("--removeUnusedShader 0 "), "{stdout}");
    Ok(())
}

#[test]
fn render_coerces_string_typed_values_from_param_file() -> Result<()> {
    let cwd = tempdir()?;
    let output = run_launcher(
        cwd.path(),
        &[
            "--jsonData",
            r#"{"targetFrame": "7", "multithread": "TRUE", "removeUnusedMipmap": "false"}"#,
            "render",
        ],
    )?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(
        stdout.starts_with("--targetFrame 7 --multithread "),
        "{stdout}"
    );
    assert!(stdout.contains("--removeUnusedMipmap 0 "), "{stdout}");
    Ok(())
}

#[test]
fn render_with_unreadable_file_fails_with_param_source_status() -> Result<()> {
    let cwd = tempdir()?;
    let missing = cwd.path().join("absent.json");
    let output = run_launcher(
        cwd.path(),
        &["--jsonData", &missing.display().to_string(), "render"],
    )?;

    assert_eq!(output.status.code(), Some(65), "{}", stderr_of(&output));
    assert!(stdout_of(&output).is_empty());
    assert!(stderr_of(&output).contains("PARAM_SOURCE_INVALID"));
    Ok(())
}

#[test]
fn render_with_mistyped_file_fails_with_param_source_status() -> Result<()> {
    let cwd = tempdir()?;
    for name in ["params_wrong_type.json", "params_truncated.json"] {
        let params = fixture(&format!("tests/fixtures/{name}"));
        let output = run_launcher(cwd.path(), &["--jsonData", &params, "render"])?;
        assert_eq!(
            output.status.code(),
            Some(65),
            "{name}: {}",
            stderr_of(&output)
        );
        assert!(stdout_of(&output).is_empty(), "{name}");
    }
    Ok(())
}

#[test]
fn schema_lists_param_file_fields() -> Result<()> {
    let cwd = tempdir()?;
    let output = run_launcher(cwd.path(), &["schema"])?;

    assert!(output.status.success(), "{}", stderr_of(&output));
    let schema: Value = serde_json::from_str(&stdout_of(&output))?;
    let properties = schema["properties"]
        .as_object()
        .expect("schema should list properties");
    assert_eq!(properties.len(), 20);
    assert!(properties.contains_key("norestoreUnusedBuffer"));
    Ok(())
}

#[test]
fn unknown_flag_is_a_usage_error() -> Result<()> {
    let cwd = tempdir()?;
    let output = run_launcher(cwd.path(), &["--fastforwardMode", "render"])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}
