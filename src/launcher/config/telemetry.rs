use tracing::{debug, info};

use super::{LauncherConfig, CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "paretrace_fastforward::config",
            path = %path.display(),
            "Loading configuration using PARETRACE_FASTFORWARD_CONFIG environment variable"
        );
    } else {
        debug!(
            target: "paretrace_fastforward::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            default = DEFAULT_CONFIG_PATH,
            "PARETRACE_FASTFORWARD_CONFIG not set; using default fastforward.toml"
        );
    }
}

pub fn log_loaded(config: &LauncherConfig) {
    info!(
        target: "paretrace_fastforward::config",
        path = %config.source_path.display(),
        program = ?config.downstream.program,
        target_component = %config.downstream.target,
        key = %config.downstream.key,
        wait_timeout_secs = config.downstream.wait_timeout_secs,
        teardown_delay_ms = config.teardown.delay.as_millis() as u64,
        force_exit = config.teardown.force_exit,
        "Configuration loaded"
    );
}
