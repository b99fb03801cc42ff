//! Resolution of the two-universe directory layout.
//!
//! The host application ships its own installed package set (the internal
//! universe) while operating on a user project with an independent manifest
//! and install directory (the external universe). This module decides
//! whether the two universes are actually distinct and computes the
//! absolute paths everything else hangs off of.
//!
//! Resolution is pure path arithmetic: it never touches the filesystem.
//! Missing or malformed manifests are reported by the configuration
//! builder, not here.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::engine::DEFAULT_MANIFEST_FILENAME;
use crate::runtime::path::{is_path_under, normalize_path};

/// Frozen result of layout resolution.
///
/// All paths are absolute (or archive-scheme locations, see
/// [`is_archive_path`]); computed once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Install root of the package set bundled with the host.
    pub internal_install_root: PathBuf,
    /// Root of the user's project.
    pub external_root: PathBuf,
    /// Location of the user project's manifest file.
    pub external_manifest_path: PathBuf,
    /// Directory the user project's packages are installed into.
    pub external_install_dir: PathBuf,
    /// True when the manifest's own `config` section declared an
    /// install directory.
    pub install_dir_overridden: bool,
    /// True when the internal package set is distinct from the external one.
    pub has_internal_repository: bool,
}

/// Inputs to layout resolution.
///
/// The internal install root is supplied explicitly by the host's bootstrap
/// step rather than inferred from the running loader's location.
#[derive(Debug, Clone)]
pub struct LayoutResolver {
    pub internal_install_root: PathBuf,
    pub external_root: PathBuf,
    /// Explicit manifest filename; defaults to the engine's conventional
    /// name when not set.
    pub manifest_filename: Option<PathBuf>,
    /// Caller-supplied external install directory.
    pub install_dir: Option<PathBuf>,
}

impl LayoutResolver {
    pub fn new(
        internal_install_root: impl Into<PathBuf>,
        external_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            internal_install_root: internal_install_root.into(),
            external_root: external_root.into(),
            manifest_filename: None,
            install_dir: None,
        }
    }

    /// Whether the internal package set is a universe of its own.
    ///
    /// True when the internal install root is not a descendant of the
    /// external project root, or when the host ships as a self-contained
    /// archive. When the host's install root lives inside the external
    /// project tree there is only one package universe.
    ///
    /// This is a best-effort heuristic carried over from the original
    /// system; symlinked roots can defeat the containment check.
    pub fn has_internal_repository(&self) -> bool {
        is_archive_path(&self.internal_install_root)
            || !is_path_under(&self.internal_install_root, &self.external_root)
    }

    /// The manifest filename as supplied by the caller, before any
    /// resolution against the external root.
    pub fn pristine_manifest_filename(&self) -> &Path {
        self.manifest_filename
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_MANIFEST_FILENAME))
    }

    /// Absolute location of the external manifest: the explicit filename
    /// when absolute, otherwise resolved against the external root.
    pub fn manifest_path(&self) -> PathBuf {
        let filename = self.pristine_manifest_filename();
        if filename.is_absolute() {
            filename.to_path_buf()
        } else {
            normalize_path(&self.external_root.join(filename))
        }
    }

    /// Compute the frozen [`Layout`].
    ///
    /// `install_dir_overridden` must reflect whether the raw manifest
    /// declared an install directory; the configuration builder detects
    /// that before merging.
    pub fn resolve(&self, config: &Config, install_dir_overridden: bool) -> Layout {
        let has_internal_repository = self.has_internal_repository();

        // The caller-supplied install directory only applies when there are
        // two distinct universes and the user's manifest did not already
        // claim the setting for itself.
        let install_dir = match &self.install_dir {
            Some(dir) if has_internal_repository && !install_dir_overridden => dir.clone(),
            _ => config.install_dir(),
        };

        let external_install_dir = if install_dir.is_absolute() {
            install_dir
        } else {
            normalize_path(&self.external_root.join(install_dir))
        };

        Layout {
            internal_install_root: self.internal_install_root.clone(),
            external_root: self.external_root.clone(),
            external_manifest_path: self.manifest_path(),
            external_install_dir,
            install_dir_overridden,
            has_internal_repository,
        }
    }
}

/// Whether a path denotes a location inside a self-contained archive
/// container (a `scheme://` prefixed location), the packaging format where
/// the host ships as one opaque file.
pub fn is_archive_path(path: &Path) -> bool {
    let text = path.to_string_lossy();
    match text.find("://") {
        Some(idx) if idx > 0 => text[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        _ => false,
    }
}
