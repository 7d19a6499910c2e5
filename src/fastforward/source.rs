//! Resolution of the `jsonData` secondary parameter source.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::lib::{errors::ParamSourceError, fs::read_param_file, paths::names_param_file};

use super::params::RawParams;

/// Where the secondary parameters come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamFileSource {
    File(PathBuf),
    Inline(String),
}

impl ParamFileSource {
    /// Classify a `jsonData` value; an empty value means no secondary source.
    pub fn classify(json_data: &str) -> Option<Self> {
        if json_data.is_empty() {
            warn!(
                target: "paretrace_fastforward::params",
                "jsonData is empty; ignoring it"
            );
            return None;
        }
        if names_param_file(json_data) {
            Some(Self::File(PathBuf::from(json_data)))
        } else {
            Some(Self::Inline(json_data.to_string()))
        }
    }

    fn origin(&self) -> String {
        match self {
            ParamFileSource::File(path) => path.display().to_string(),
            ParamFileSource::Inline(_) => "inline jsonData".to_string(),
        }
    }

    /// Read (if needed) and parse the source into per-field parameters.
    pub fn load(&self) -> Result<RawParams, ParamSourceError> {
        let result = match self {
            ParamFileSource::File(path) => {
                info!(
                    target: "paretrace_fastforward::params",
                    path = %path.display(),
                    "Loading parameters from jsonData file"
                );
                read_param_file(path).and_then(|content| parse_params(&content, self.origin()))
            }
            ParamFileSource::Inline(content) => parse_params(content, self.origin()),
        };

        match result {
            Ok(raw) => {
                info!(
                    target: "paretrace_fastforward::params",
                    origin = %self.origin(),
                    fields = ?raw.present_fields(),
                    "Loaded jsonData parameters"
                );
                Ok(raw)
            }
            Err(err) => {
                error!(
                    target: "paretrace_fastforward::params",
                    origin = %self.origin(),
                    reason = %err,
                    "Failed to load jsonData parameters"
                );
                Err(err)
            }
        }
    }
}

/// Parse into an object first so a repeated key keeps its last value.
fn parse_params(content: &str, origin: String) -> Result<RawParams, ParamSourceError> {
    serde_json::from_str::<Map<String, Value>>(content)
        .and_then(|object| serde_json::from_value(Value::Object(object)))
        .map_err(|source| ParamSourceError::Parse { origin, source })
}

/// Resolve an optional `jsonData` value into secondary parameters.
pub fn load_secondary(json_data: Option<&str>) -> Result<Option<RawParams>, ParamSourceError> {
    json_data
        .and_then(ParamFileSource::classify)
        .map(|source| source.load())
        .transpose()
}
