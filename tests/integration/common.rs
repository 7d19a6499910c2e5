use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use anyhow::{Context, Result};

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_paretrace-fastforward");
pub const CONFIG_ENV_KEY: &str = "PARETRACE_FASTFORWARD_CONFIG";

pub fn fixture(relative: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    root.join(relative).display().to_string()
}

/// Run the launcher in `cwd` with no inherited config override.
pub fn run_launcher(cwd: &Path, args: &[&str]) -> Result<Output> {
    Command::new(BINARY_PATH)
        .args(args)
        .current_dir(cwd)
        .env_remove(CONFIG_ENV_KEY)
        .env("RUST_LOG", "paretrace_fastforward=debug")
        .stdin(Stdio::null())
        .output()
        .context("failed to run launcher binary")
}

/// Write a launcher config whose downstream program is `/bin/sh -c <script>`.
pub fn write_shell_config(dir: &Path, script: &str, force_exit: bool) -> Result<PathBuf> {
    let path = dir.join("fastforward.toml");
    let escaped = script.replace('\\', "\\\\").replace('"', "\\\"");
    let contents = format!(
        "[downstream]\n\
program = \"/bin/sh\"\n\
args = [\"-c\", \"{escaped}\", \"replay\"]\n\
wait_timeout_secs = 30\n\
\n\
[teardown]\n\
delay_ms = 0\n\
force_exit = {force_exit}\n"
    );
    fs::write(&path, contents)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    Ok(path)
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
