//! Shared helpers for classifying path-like values.

use std::path::Path;

/// Returns true if the path is non-empty and absolute.
pub fn is_nonempty_absolute(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_absolute()
}

/// A `jsonData` value names a file when it starts with `/` or a letter.
pub fn names_param_file(value: &str) -> bool {
    value
        .chars()
        .next()
        .is_some_and(|first| first == '/' || first.is_alphabetic())
}
