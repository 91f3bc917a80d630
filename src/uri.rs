//! URI helpers for connection roots.
//! Mirrors the small set of primitives the original engine's `utils/uri.py`
//! exposed: scheme detection, path<->URI conversion, and absolute-path
//! normalization, adapted to Rust's `Path`/`PathBuf`.

use std::path::{Path, PathBuf};

/// Returns the scheme of a URI (`"file"`, `"s3"`, ...), or empty string if
/// the input has no `scheme://` prefix.
pub fn uri_scheme(uri: &str) -> String {
    match uri.find("://") {
        Some(idx) => uri[..idx].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// A string is a URI if it carries a non-empty scheme followed by `://`.
pub fn is_uri(s: &str) -> bool {
    !uri_scheme(s).is_empty()
}

/// The part of the URI after `scheme://`.
pub fn uri_path(uri: &str) -> &str {
    match uri.find("://") {
        Some(idx) => &uri[idx + 3..],
        None => uri,
    }
}

/// Ensures `path` is absolute, resolving it against `parent` otherwise.
pub fn ensure_absolute_path(path: &str, parent: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        Path::new(parent).join(p)
    }
}

/// Builds a `scheme://path` URI from a filesystem path or bucket path.
pub fn path_to_uri(path: &Path, scheme: &str) -> String {
    format!("{scheme}://{}", path.to_string_lossy())
}

/// Normalizes arbitrary user input (bare path, `file://`, or `s3://`) into an
/// absolute URI. Non-URI inputs are treated as relative local paths per
/// spec.md §6.
pub fn normalize_root(input: &str, cwd: &Path) -> String {
    if is_uri(input) {
        input.to_string()
    } else {
        let abs = ensure_absolute_path(input, &cwd.to_string_lossy());
        path_to_uri(&abs, "file")
    }
}

/// Joins a base URI with a child path segment (table name, file name),
/// respecting the scheme.
pub fn join(base: &str, child: &str) -> String {
    let base = base.trim_end_matches('/');
    format!("{base}/{child}")
}
