//! Rendering of a merged record into the retracer argument string.

use std::fmt::{self, Write as _};

use serde::Serialize;

use super::params::{ParamField, ParamRecord, ParamValue, RenderMode, UNSET_FRAME};

/// The forwarded argument string, treated as opaque by everything downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ForwardArgs(String);

impl ForwardArgs {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ForwardArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render every field in table order. Each emitted flag group ends with a space.
pub fn render(record: &ParamRecord) -> ForwardArgs {
    let mut args = String::new();
    for field in ParamField::ALL {
        render_field(&mut args, field, record.value(field));
    }
    ForwardArgs(args)
}

fn render_field(out: &mut String, field: ParamField, value: ParamValue<'_>) {
    let name = field.name();
    // Writing into a String cannot fail.
    let _ = match (field.render_mode(), value) {
        (RenderMode::Path, ParamValue::Path(Some(path))) => write!(out, "--{name} {path} "),
        (RenderMode::Integer, ParamValue::Integer(number)) if number != UNSET_FRAME => {
            write!(out, "--{name} {number} ")
        }
        (RenderMode::Flag, ParamValue::Bool(true)) => write!(out, "--{name} "),
        (RenderMode::Toggle, ParamValue::Bool(enabled)) => {
            write!(out, "--{name} {} ", u8::from(enabled))
        }
        _ => Ok(()),
    };
}
