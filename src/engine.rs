//! Boundary traits for the embedded package engine.
//!
//! The engine itself (constraint solving, fetch/install, autoload
//! generation) lives outside this crate. These traits describe the
//! capabilities consumed from it, plus the file-layout conventions shared
//! with it. Nothing here is reimplemented engine behavior.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::package::CompositeRepository;

/// Conventional manifest filename.
pub const DEFAULT_MANIFEST_FILENAME: &str = "pkg.json";
/// Default install directory, relative to the project root.
pub const DEFAULT_INSTALL_DIR: &str = "packages";
/// Metadata directory the engine keeps under an install directory.
pub const METADATA_DIR: &str = "pkg";
/// Installed-package list inside [`METADATA_DIR`].
pub const INSTALLED_FILENAME: &str = "installed.json";
/// Synthetic root-package record inside [`METADATA_DIR`].
pub const ROOT_PACKAGE_FILENAME: &str = ".root_package.json";
/// Generated autoload bootstrap at the top of an install directory.
pub const AUTOLOAD_FILENAME: &str = "autoload.json";

/// Location of the installed-package metadata for an install directory.
pub fn installed_path(install_dir: &Path) -> PathBuf {
    install_dir.join(METADATA_DIR).join(INSTALLED_FILENAME)
}

/// Location of the synthetic root-package record for an install directory.
pub fn root_package_path(install_dir: &Path) -> PathBuf {
    install_dir.join(METADATA_DIR).join(ROOT_PACKAGE_FILENAME)
}

/// Location of the generated autoload bootstrap for an install directory.
pub fn autoload_path(install_dir: &Path) -> PathBuf {
    install_dir.join(AUTOLOAD_FILENAME)
}

/// Console-style output sink handed through to the engine.
pub trait Io {
    fn write_line(&mut self, message: &str);
}

/// Discards all output.
pub struct NullIo;

impl Io for NullIo {
    fn write_line(&mut self, _message: &str) {}
}

/// Options for an install or update run, forwarded to the engine installer.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub prefer_source: bool,
    pub dev_mode: bool,
    pub run_scripts: bool,
    pub update: bool,
    /// Packages to restrict an update to; empty means all.
    pub update_allowlist: Vec<String>,
}

/// Factory capabilities of the external package engine.
pub trait Engine: Send + Sync {
    /// The engine's default configuration, before any manifest is merged.
    fn default_config(&self) -> Config;

    /// Create an engine session for the given manifest.
    ///
    /// The install directory is passed explicitly when the caller wants to
    /// steer it; `None` means the engine should honor the manifest's own
    /// configuration.
    fn create_session(
        &self,
        io: &mut dyn Io,
        manifest_path: &Path,
        install_dir: Option<PathBuf>,
    ) -> Result<Box<dyn EngineSession>>;
}

/// One live engine instance bound to a manifest.
pub trait EngineSession {
    /// Create an installer. `additional_installed` supplies packages the
    /// engine should treat as already installed without owning them (the
    /// host's internal package set).
    fn create_installer(
        &self,
        io: &mut dyn Io,
        additional_installed: Option<&CompositeRepository>,
    ) -> Result<Box<dyn Installer>>;

    /// Dispatch a named lifecycle event through the engine's event system.
    fn dispatch(&self, event: &str, io: &mut dyn Io) -> Result<()>;

    /// Regenerate the autoload bootstrap.
    fn dump_autoload(&self, optimize: bool) -> Result<()>;
}

/// Engine-owned install/update runner.
pub trait Installer {
    fn run(&mut self, options: &InstallOptions) -> Result<()>;
}
