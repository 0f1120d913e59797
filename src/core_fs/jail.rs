//! Root-jailed path resolution.
//!
//! Every filesystem operation turns client input into a physical path through
//! [`resolve`]. Normalization is purely lexical: `//` and `.` segments vanish and
//! each `..` removes the previous resolved segment, stopping at the jail root.
//! Symlinks are not resolved, so a link inside the root that points outside it
//! is followed by whatever opens the resulting path.

use std::path::{Path, PathBuf};

/// Collapses `current_dir` + `component` into a normalized virtual path that
/// always starts with `/`. A component starting with `/` is anchored at the
/// jail root instead of `current_dir`.
pub fn normalize_virtual(current_dir: &str, component: &str) -> String {
    let base = if component.starts_with('/') {
        ""
    } else {
        current_dir
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(component.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                // Clamped: popping an empty stack keeps us at the root.
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Maps a normalized virtual path onto the physical tree under `root`.
pub fn to_physical(root: &Path, virtual_path: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in virtual_path.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}

/// Resolves a client-supplied component against the session's current
/// directory. The result always has `root` as a prefix.
pub fn resolve(root: &Path, current_dir: &str, component: &str) -> PathBuf {
    to_physical(root, &normalize_virtual(current_dir, component))
}
