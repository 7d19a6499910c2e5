//! File helpers for parameter sources.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::lib::errors::ParamSourceError;

/// Read a parameter file into memory.
pub fn read_param_file(path: &Path) -> Result<String, ParamSourceError> {
    fs::read_to_string(path).map_err(|source| ParamSourceError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Join `relative` onto `base` unless it is already absolute.
pub fn absolutize(base: &Path, relative: PathBuf) -> PathBuf {
    if relative.is_absolute() {
        relative
    } else {
        base.join(relative)
    }
}
