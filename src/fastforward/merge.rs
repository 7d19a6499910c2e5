//! Source-priority merge of activation extras and file parameters.

use std::collections::BTreeMap;

use tracing::debug;

use super::params::{ParamField, ParamRecord, RawParams};

/// Which source supplied a merged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOrigin {
    Activation,
    File,
    Default,
}

impl ParamOrigin {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParamOrigin::Activation => "activation",
            ParamOrigin::File => "file",
            ParamOrigin::Default => "default",
        }
    }
}

/// Merged record plus the origin of every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedParams {
    pub record: ParamRecord,
    origins: BTreeMap<ParamField, ParamOrigin>,
}

impl MergedParams {
    pub fn origin(&self, field: ParamField) -> ParamOrigin {
        self.origins
            .get(&field)
            .copied()
            .unwrap_or(ParamOrigin::Default)
    }

    /// Fields filled from the secondary source, in rendering order.
    pub fn fields_from_file(&self) -> Vec<&'static str> {
        self.origins
            .iter()
            .filter(|(_, origin)| **origin == ParamOrigin::File)
            .map(|(field, _)| field.name())
            .collect()
    }
}

struct Merger<'a> {
    primary: &'a RawParams,
    secondary: Option<&'a RawParams>,
    origins: BTreeMap<ParamField, ParamOrigin>,
}

impl<'a> Merger<'a> {
    fn pick<T: Clone>(
        &mut self,
        field: ParamField,
        select: impl Fn(&RawParams) -> &Option<T>,
        default: T,
    ) -> T {
        let (value, origin) = if let Some(value) = select(self.primary) {
            (value.clone(), ParamOrigin::Activation)
        } else if let Some(value) = self.secondary.and_then(|raw| select(raw).as_ref()) {
            (value.clone(), ParamOrigin::File)
        } else {
            (default, ParamOrigin::Default)
        };
        self.origins.insert(field, origin);
        value
    }

    fn pick_optional<T: Clone>(
        &mut self,
        field: ParamField,
        select: impl Fn(&RawParams) -> &Option<T>,
    ) -> Option<T> {
        let primary = select(self.primary).clone();
        let secondary = self.secondary.and_then(|raw| select(raw).clone());
        let origin = match (&primary, &secondary) {
            (Some(_), _) => ParamOrigin::Activation,
            (None, Some(_)) => ParamOrigin::File,
            (None, None) => ParamOrigin::Default,
        };
        self.origins.insert(field, origin);
        primary.or(secondary)
    }
}

/// Take each field from `primary` if present, else from `secondary`, else its default.
pub fn merge(primary: &RawParams, secondary: Option<&RawParams>) -> MergedParams {
    let defaults = ParamRecord::default();
    let mut merger = Merger {
        primary,
        secondary,
        origins: BTreeMap::new(),
    };

    let record = ParamRecord {
        input: merger.pick_optional(ParamField::Input, |raw| &raw.input),
        output: merger.pick_optional(ParamField::Output, |raw| &raw.output),
        target_frame: merger.pick(
            ParamField::TargetFrame,
            |raw| &raw.target_frame,
            defaults.target_frame,
        ),
        end_frame: merger.pick(
            ParamField::EndFrame,
            |raw| &raw.end_frame,
            defaults.end_frame,
        ),
        multithread: merger.pick(
            ParamField::Multithread,
            |raw| &raw.multithread,
            defaults.multithread,
        ),
        offscreen: merger.pick(
            ParamField::Offscreen,
            |raw| &raw.offscreen,
            defaults.offscreen,
        ),
        noscreen: merger.pick(ParamField::Noscreen, |raw| &raw.noscreen, defaults.noscreen),
        norestoretex: merger.pick(
            ParamField::Norestoretex,
            |raw| &raw.norestoretex,
            defaults.norestoretex,
        ),
        version: merger.pick(ParamField::Version, |raw| &raw.version, defaults.version),
        restorefbo0: merger.pick(
            ParamField::Restorefbo0,
            |raw| &raw.restorefbo0,
            defaults.restorefbo0,
        ),
        remove_unused_shader: merger.pick(
            ParamField::RemoveUnusedShader,
            |raw| &raw.remove_unused_shader,
            defaults.remove_unused_shader,
        ),
        remove_unused_mipmap: merger.pick(
            ParamField::RemoveUnusedMipmap,
            |raw| &raw.remove_unused_mipmap,
            defaults.remove_unused_mipmap,
        ),
        remove_unused_buffer: merger.pick(
            ParamField::RemoveUnusedBuffer,
            |raw| &raw.remove_unused_buffer,
            defaults.remove_unused_buffer,
        ),
        norestore_unused_buffer: merger.pick(
            ParamField::NorestoreUnusedBuffer,
            |raw| &raw.norestore_unused_buffer,
            defaults.norestore_unused_buffer,
        ),
        remove_buffer_sub_data: merger.pick(
            ParamField::RemoveBufferSubData,
            |raw| &raw.remove_buffer_sub_data,
            defaults.remove_buffer_sub_data,
        ),
        remove_unusedtex: merger.pick(
            ParamField::RemoveUnusedtex,
            |raw| &raw.remove_unusedtex,
            defaults.remove_unusedtex,
        ),
        norestore_unusedtex: merger.pick(
            ParamField::NorestoreUnusedtex,
            |raw| &raw.norestore_unusedtex,
            defaults.norestore_unusedtex,
        ),
        remove_tex_sub_image: merger.pick(
            ParamField::RemoveTexSubImage,
            |raw| &raw.remove_tex_sub_image,
            defaults.remove_tex_sub_image,
        ),
        remove_copy_image: merger.pick(
            ParamField::RemoveCopyImage,
            |raw| &raw.remove_copy_image,
            defaults.remove_copy_image,
        ),
        remove_buffer_map: merger.pick(
            ParamField::RemoveBufferMap,
            |raw| &raw.remove_buffer_map,
            defaults.remove_buffer_map,
        ),
    };

    for (field, origin) in &merger.origins {
        debug!(
            target: "paretrace_fastforward::params",
            field = field.name(),
            origin = origin.as_str(),
            "Resolved parameter"
        );
    }

    MergedParams {
        record,
        origins: merger.origins,
    }
}
