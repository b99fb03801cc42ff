//! Path utility functions for normalization and comparison.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {
                // Skip `.` components
            }
            Component::ParentDir => {
                // Pop the last component if possible
                if !result.pop() {
                    // If we can't pop (e.g., at root), keep the `..`
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path
/// components. Returns true if `path` is under `dir` (i.e., `dir` is a
/// prefix of `path`). Both paths are normalized first, so `..` components
/// cannot fake containment.
///
/// Symlinked roots can still defeat this check; it is a lexical comparison,
/// not a filesystem one.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    // Path must have at least as many components as dir
    if path_components.len() < dir_components.len() {
        return false;
    }

    // All dir components must match the beginning of path components
    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}
