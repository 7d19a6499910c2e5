//! Replay parameter record, per-source view and field table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Value of an integer field that means "not set".
pub const UNSET_FRAME: i32 = -1;

/// How a field is written into the forwarded argument string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// `--name <value>` when present.
    Path,
    /// `--name <value>` unless the value is [`UNSET_FRAME`].
    Integer,
    /// Bare `--name` when true, omitted when false.
    Flag,
    /// Always `--name 1` or `--name 0`.
    Toggle,
}

/// Every replay parameter, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamField {
    Input,
    Output,
    TargetFrame,
    EndFrame,
    Multithread,
    Offscreen,
    Noscreen,
    Norestoretex,
    Version,
    Restorefbo0,
    RemoveUnusedShader,
    RemoveUnusedMipmap,
    RemoveUnusedBuffer,
    NorestoreUnusedBuffer,
    RemoveBufferSubData,
    RemoveUnusedtex,
    NorestoreUnusedtex,
    RemoveTexSubImage,
    RemoveCopyImage,
    RemoveBufferMap,
}

impl ParamField {
    pub const ALL: [ParamField; 20] = [
        ParamField::Input,
        ParamField::Output,
        ParamField::TargetFrame,
        ParamField::EndFrame,
        ParamField::Multithread,
        ParamField::Offscreen,
        ParamField::Noscreen,
        ParamField::Norestoretex,
        ParamField::Version,
        ParamField::Restorefbo0,
        ParamField::RemoveUnusedShader,
        ParamField::RemoveUnusedMipmap,
        ParamField::RemoveUnusedBuffer,
        ParamField::NorestoreUnusedBuffer,
        ParamField::RemoveBufferSubData,
        ParamField::RemoveUnusedtex,
        ParamField::NorestoreUnusedtex,
        ParamField::RemoveTexSubImage,
        ParamField::RemoveCopyImage,
        ParamField::RemoveBufferMap,
    ];

    /// Wire name shared by activation extras, the JSON file and the rendered flags.
    pub const fn name(&self) -> &'static str {
        match self {
            ParamField::Input => "input",
            ParamField::Output => "output",
            ParamField::TargetFrame => "targetFrame",
            ParamField::EndFrame => "endFrame",
            ParamField::Multithread => "multithread",
            ParamField::Offscreen => "offscreen",
            ParamField::Noscreen => "noscreen",
            ParamField::Norestoretex => "norestoretex",
            ParamField::Version => "version",
            ParamField::Restorefbo0 => "restorefbo0",
            ParamField::RemoveUnusedShader => "removeUnusedShader",
            ParamField::RemoveUnusedMipmap => "removeUnusedMipmap",
            ParamField::RemoveUnusedBuffer => "removeUnusedBuffer",
            ParamField::NorestoreUnusedBuffer => "norestoreUnusedBuffer",
            ParamField::RemoveBufferSubData => "removeBufferSubData",
            ParamField::RemoveUnusedtex => "removeUnusedtex",
            ParamField::NorestoreUnusedtex => "norestoreUnusedtex",
            ParamField::RemoveTexSubImage => "removeTexSubImage",
            ParamField::RemoveCopyImage => "removeCopyImage",
            ParamField::RemoveBufferMap => "removeBufferMap",
        }
    }

    pub const fn render_mode(&self) -> RenderMode {
        match self {
            ParamField::Input | ParamField::Output => RenderMode::Path,
            ParamField::TargetFrame | ParamField::EndFrame | ParamField::Restorefbo0 => {
                RenderMode::Integer
            }
            ParamField::RemoveUnusedShader
            | ParamField::RemoveUnusedMipmap
            | ParamField::RemoveUnusedBuffer
            | ParamField::NorestoreUnusedBuffer
            | ParamField::RemoveBufferSubData => RenderMode::Toggle,
            _ => RenderMode::Flag,
        }
    }
}

/// A single field value borrowed from a [`ParamRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue<'a> {
    Path(Option<&'a str>),
    Integer(i32),
    Bool(bool),
}

/// Replay parameters after merging, with every default applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamRecord {
    pub input: Option<String>,
    pub output: Option<String>,
    pub target_frame: i32,
    pub end_frame: i32,
    pub multithread: bool,
    pub offscreen: bool,
    pub noscreen: bool,
    pub norestoretex: bool,
    pub version: bool,
    pub restorefbo0: i32,
    pub remove_unused_shader: bool,
    pub remove_unused_mipmap: bool,
    pub remove_unused_buffer: bool,
    pub norestore_unused_buffer: bool,
    pub remove_buffer_sub_data: bool,
    pub remove_unusedtex: bool,
    pub norestore_unusedtex: bool,
    pub remove_tex_sub_image: bool,
    pub remove_copy_image: bool,
    pub remove_buffer_map: bool,
}

impl Default for ParamRecord {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            target_frame: UNSET_FRAME,
            end_frame: UNSET_FRAME,
            multithread: false,
            offscreen: false,
            noscreen: false,
            norestoretex: false,
            version: false,
            restorefbo0: UNSET_FRAME,
            remove_unused_shader: true,
            remove_unused_mipmap: true,
            remove_unused_buffer: true,
            norestore_unused_buffer: true,
            remove_buffer_sub_data: true,
            remove_unusedtex: false,
            norestore_unusedtex: false,
            remove_tex_sub_image: false,
            remove_copy_image: false,
            remove_buffer_map: false,
        }
    }
}

impl ParamRecord {
    pub fn value(&self, field: ParamField) -> ParamValue<'_> {
        match field {
            ParamField::Input => ParamValue::Path(self.input.as_deref()),
            ParamField::Output => ParamValue::Path(self.output.as_deref()),
            ParamField::TargetFrame => ParamValue::Integer(self.target_frame),
            ParamField::EndFrame => ParamValue::Integer(self.end_frame),
            ParamField::Multithread => ParamValue::Bool(self.multithread),
            ParamField::Offscreen => ParamValue::Bool(self.offscreen),
            ParamField::Noscreen => ParamValue::Bool(self.noscreen),
            ParamField::Norestoretex => ParamValue::Bool(self.norestoretex),
            ParamField::Version => ParamValue::Bool(self.version),
            ParamField::Restorefbo0 => ParamValue::Integer(self.restorefbo0),
            ParamField::RemoveUnusedShader => ParamValue::Bool(self.remove_unused_shader),
            ParamField::RemoveUnusedMipmap => ParamValue::Bool(self.remove_unused_mipmap),
            ParamField::RemoveUnusedBuffer => ParamValue::Bool(self.remove_unused_buffer),
            ParamField::NorestoreUnusedBuffer => ParamValue::Bool(self.norestore_unused_buffer),
            ParamField::RemoveBufferSubData => ParamValue::Bool(self.remove_buffer_sub_data),
            ParamField::RemoveUnusedtex => ParamValue::Bool(self.remove_unusedtex),
            ParamField::NorestoreUnusedtex => ParamValue::Bool(self.norestore_unusedtex),
            ParamField::RemoveTexSubImage => ParamValue::Bool(self.remove_tex_sub_image),
            ParamField::RemoveCopyImage => ParamValue::Bool(self.remove_copy_image),
            ParamField::RemoveBufferMap => ParamValue::Bool(self.remove_buffer_map),
        }
    }
}

/// Parameters supplied by one source (activation extras or a JSON file).
///
/// `None` means the source does not carry the field. Unknown JSON keys are
/// ignored so the same file can hold settings for the replay program itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[schemars(title = "ParamFile", description = "Fast-forward replay parameters")]
pub struct RawParams {
    /// Trace input path.
    pub input: Option<String>,
    /// Trace output path.
    pub output: Option<String>,
    /// Frame to fast-forward to; -1 leaves it unset.
    #[serde(deserialize_with = "lenient::int")]
    #[schemars(with = "Option<i32>")]
    pub target_frame: Option<i32>,
    /// Last frame to replay; -1 leaves it unset.
    #[serde(deserialize_with = "lenient::int")]
    #[schemars(with = "Option<i32>")]
    pub end_frame: Option<i32>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub multithread: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub offscreen: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub noscreen: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub norestoretex: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub version: Option<bool>,
    #[serde(deserialize_with = "lenient::int")]
    #[schemars(with = "Option<i32>")]
    pub restorefbo0: Option<i32>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_unused_shader: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_unused_mipmap: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_unused_buffer: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub norestore_unused_buffer: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_buffer_sub_data: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_unusedtex: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub norestore_unusedtex: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_tex_sub_image: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_copy_image: Option<bool>,
    #[serde(deserialize_with = "lenient::boolean")]
    #[schemars(with = "Option<bool>")]
    pub remove_buffer_map: Option<bool>,
}

impl RawParams {
    /// Names of the fields this source carries, in rendering order.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut present = Vec::new();
        let flags = [
            self.input.is_some(),
            self.output.is_some(),
            self.target_frame.is_some(),
            self.end_frame.is_some(),
            self.multithread.is_some(),
            self.offscreen.is_some(),
            self.noscreen.is_some(),
            self.norestoretex.is_some(),
            self.version.is_some(),
            self.restorefbo0.is_some(),
            self.remove_unused_shader.is_some(),
            self.remove_unused_mipmap.is_some(),
            self.remove_unused_buffer.is_some(),
            self.norestore_unused_buffer.is_some(),
            self.remove_buffer_sub_data.is_some(),
            self.remove_unusedtex.is_some(),
            self.norestore_unusedtex.is_some(),
            self.remove_tex_sub_image.is_some(),
            self.remove_copy_image.is_some(),
            self.remove_buffer_map.is_some(),
        ];
        for (field, is_present) in ParamField::ALL.iter().zip(flags) {
            if is_present {
                present.push(field.name());
            }
        }
        present
    }
}

/// Value coercions matching how the replay app reads its parameter file.
mod lenient {
    use serde::{
        de::{Error, Unexpected},
        Deserialize, Deserializer,
    };
    use serde_json::Value;

    const EXPECTED_INT: &str = "an integer or a numeric string";
    const EXPECTED_BOOL: &str = "a boolean or \"true\"/\"false\"";

    /// A JSON number (fraction truncated) or a numeric string.
    pub fn int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Value::Number(number)) => {
                let value = match number.as_i64() {
                    Some(whole) => i32::try_from(whole).ok(),
                    None => number.as_f64().and_then(truncate),
                };
                value.map(Some).ok_or_else(|| {
                    D::Error::invalid_value(Unexpected::Other("number"), &EXPECTED_INT)
                })
            }
            Some(Value::String(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(truncate)
                .map(Some)
                .ok_or_else(|| D::Error::invalid_value(Unexpected::Str(&text), &EXPECTED_INT)),
            Some(other) => Err(D::Error::invalid_type(unexpected(&other), &EXPECTED_INT)),
        }
    }

    /// A JSON boolean or the strings `true`/`false` in any case.
    pub fn boolean<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(value)),
            Some(Value::String(text)) if text.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Value::String(text)) if text.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(D::Error::invalid_type(unexpected(&other), &EXPECTED_BOOL)),
        }
    }

    fn truncate(value: f64) -> Option<i32> {
        let whole = value.trunc();
        (whole >= f64::from(i32::MIN) && whole <= f64::from(i32::MAX)).then_some(whole as i32)
    }

    fn unexpected(value: &Value) -> Unexpected<'_> {
        match value {
            Value::Null => Unexpected::Unit,
            Value::Bool(value) => Unexpected::Bool(*value),
            Value::Number(_) => Unexpected::Other("number"),
            Value::String(text) => Unexpected::Str(text),
            Value::Array(_) => Unexpected::Seq,
            Value::Object(_) => Unexpected::Map,
        }
    }
}
