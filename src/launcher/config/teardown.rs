use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::{fastforward::DEFAULT_TEARDOWN_DELAY, lib::errors::ConfigError};

const MAX_TEARDOWN_DELAY_MS: u64 = 60_000;

/// What happens after the lifecycle is destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownSection {
    pub delay: Duration,
    /// Terminate the launcher process once the delay has elapsed.
    pub force_exit: bool,
}

impl Default for TeardownSection {
    fn default() -> Self {
        Self {
            delay: DEFAULT_TEARDOWN_DELAY,
            force_exit: true,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawTeardownSection {
    pub delay_ms: Option<u64>,
    pub force_exit: Option<bool>,
}

pub fn parse_teardown_section(
    raw: Option<RawTeardownSection>,
    path: &Path,
) -> Result<TeardownSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let defaults = TeardownSection::default();

    let delay = match raw.delay_ms {
        Some(ms) if ms > MAX_TEARDOWN_DELAY_MS => {
            return Err(ConfigError::InvalidField {
                path: path.to_path_buf(),
                field: "teardown.delay_ms",
                message: "Use a delay in the range 0-60000".into(),
            })
        }
        Some(ms) => Duration::from_millis(ms),
        None => defaults.delay,
    };

    Ok(TeardownSection {
        delay,
        force_exit: raw.force_exit.unwrap_or(defaults.force_exit),
    })
}
