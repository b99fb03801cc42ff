//! The embedded composer facade and its builder.
//!
//! `EmbeddedComposerBuilder` collects settings, then `build()` runs layout
//! resolution, configuration loading and repository composition in that
//! order and hands back an immutable `EmbeddedComposer`. Building is
//! one-shot: once the builder is configured, further setter or `build()`
//! calls are usage errors.

use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ConfigError, load_external_config};
use crate::engine::{self, Engine, EngineSession, Installer, Io};
use crate::layout::{Layout, LayoutResolver, is_archive_path};
use crate::loader::ClassLoader;
use crate::package::{
    CompositeRepository, InstalledRepository, PackageRecord, Repository, canonical_packages,
    find_package,
};
use crate::runtime::{Runtime, normalize_path};

/// Implemented by host applications that carry an embedded composer, so
/// console glue can reach it.
pub trait EmbeddedComposerAware<R: Runtime> {
    fn embedded_composer(&self) -> &EmbeddedComposer<R>;
}

#[derive(Debug, PartialEq, Eq)]
enum BuilderState {
    Unconfigured,
    Configured,
}

/// Builder for [`EmbeddedComposer`].
///
/// The internal install root is supplied by the host's bootstrap step; the
/// external root defaults to the current working directory.
pub struct EmbeddedComposerBuilder<R: Runtime> {
    runtime: Arc<R>,
    engine: Arc<dyn Engine>,
    class_loader: Arc<dyn ClassLoader>,
    internal_install_root: PathBuf,
    external_root: PathBuf,
    manifest_filename: Option<PathBuf>,
    install_dir: Option<PathBuf>,
    state: BuilderState,
}

impl<R: Runtime> EmbeddedComposerBuilder<R> {
    pub fn new(
        runtime: R,
        engine: Arc<dyn Engine>,
        class_loader: Arc<dyn ClassLoader>,
        internal_install_root: impl Into<PathBuf>,
        external_root: Option<PathBuf>,
    ) -> Result<Self> {
        let runtime = Arc::new(runtime);

        let external_root = match external_root {
            Some(root) if root.is_absolute() => normalize_path(&root),
            Some(root) => normalize_path(&runtime.current_dir()?.join(root)),
            None => runtime.current_dir()?,
        };

        let internal_install_root = internal_install_root.into();
        let internal_install_root = if is_archive_path(&internal_install_root) {
            internal_install_root
        } else if internal_install_root.is_absolute() {
            normalize_path(&internal_install_root)
        } else {
            normalize_path(&runtime.current_dir()?.join(&internal_install_root))
        };

        Ok(Self {
            runtime,
            engine,
            class_loader,
            internal_install_root,
            external_root,
            manifest_filename: None,
            install_dir: None,
            state: BuilderState::Unconfigured,
        })
    }

    /// Set the manifest filename. Defaults to the engine's conventional
    /// name when not set.
    pub fn set_manifest_filename(&mut self, filename: impl Into<PathBuf>) -> Result<()> {
        self.ensure_unconfigured("manifest filename")?;
        self.manifest_filename = Some(filename.into());
        Ok(())
    }

    /// Set the external install directory. Defaults to the configured
    /// install directory when not set.
    pub fn set_install_dir(&mut self, install_dir: impl Into<PathBuf>) -> Result<()> {
        self.ensure_unconfigured("install directory")?;
        self.install_dir = Some(install_dir.into());
        Ok(())
    }

    fn ensure_unconfigured(&self, setting: &str) -> Result<()> {
        if self.state == BuilderState::Configured {
            bail!(
                "cannot change the {setting}: the embedded composer is already configured \
                 and its resolved paths are frozen"
            );
        }
        Ok(())
    }

    /// Run layout resolution, configuration loading and repository
    /// composition, and freeze the result.
    ///
    /// Manifest problems are recorded on the returned facade rather than
    /// failing the build; see [`EmbeddedComposer::error`]. Building twice
    /// is a usage error.
    #[tracing::instrument(skip(self))]
    pub fn build(&mut self) -> Result<EmbeddedComposer<R>> {
        if self.state == BuilderState::Configured {
            bail!("the embedded composer is already configured; build() may only run once");
        }

        let mut resolver =
            LayoutResolver::new(&self.internal_install_root, &self.external_root);
        resolver.manifest_filename = self.manifest_filename.clone();
        resolver.install_dir = self.install_dir.clone();

        let manifest_path = resolver.manifest_path();
        let pristine_filename = resolver.pristine_manifest_filename().to_path_buf();
        let loaded = load_external_config(
            self.runtime.as_ref(),
            self.engine.as_ref(),
            &manifest_path,
            &pristine_filename,
            &self.external_root,
        );

        let layout = resolver.resolve(&loaded.config, loaded.install_dir_overridden);
        debug!(
            "Resolved layout: internal repository {}, install dir {:?}",
            if layout.has_internal_repository {
                "present"
            } else {
                "absent"
            },
            layout.external_install_dir
        );

        let external_repository = Arc::new(
            InstalledRepository::load(
                self.runtime.as_ref(),
                &engine::installed_path(&layout.external_install_dir),
            )
            .context("Failed to load the external package repository")?,
        );

        let mut internal_repository = CompositeRepository::empty();
        if layout.has_internal_repository {
            let installed = InstalledRepository::load(
                self.runtime.as_ref(),
                &engine::installed_path(&layout.internal_install_root),
            )
            .context("Failed to load the internal package repository")?;
            internal_repository.add_repository(Arc::new(installed));

            // The host's own build step may have registered itself as a
            // discoverable package.
            let root_package_path = engine::root_package_path(&layout.internal_install_root);
            if self.runtime.exists(&root_package_path) {
                let root_package =
                    InstalledRepository::load(self.runtime.as_ref(), &root_package_path)
                        .context("Failed to load the internal root package record")?;
                internal_repository.add_repository(Arc::new(root_package));
            }
        }
        let internal_repository = Arc::new(internal_repository);

        let repository = Arc::new(CompositeRepository::new(vec![
            external_repository.clone() as Arc<dyn Repository>,
            internal_repository.clone() as Arc<dyn Repository>,
        ]));

        self.state = BuilderState::Configured;

        Ok(EmbeddedComposer {
            runtime: self.runtime.clone(),
            engine: self.engine.clone(),
            class_loader: self.class_loader.clone(),
            layout,
            config: loaded.config,
            error: loaded.error,
            external_repository,
            internal_repository,
            repository,
        })
    }
}

/// Read-only view over the composed package universes.
///
/// Immutable once built; safe to share by reference for the rest of the
/// process.
pub struct EmbeddedComposer<R: Runtime> {
    runtime: Arc<R>,
    engine: Arc<dyn Engine>,
    class_loader: Arc<dyn ClassLoader>,
    layout: Layout,
    config: Config,
    error: Option<ConfigError>,
    external_repository: Arc<InstalledRepository>,
    internal_repository: Arc<CompositeRepository>,
    repository: Arc<CompositeRepository>,
}

impl<R: Runtime> EmbeddedComposer<R> {
    pub fn class_loader(&self) -> &Arc<dyn ClassLoader> {
        &self.class_loader
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn external_root(&self) -> &Path {
        &self.layout.external_root
    }

    pub fn external_manifest_path(&self) -> &Path {
        &self.layout.external_manifest_path
    }

    /// The merged external configuration. When [`Self::error`] is set this
    /// still carries usable engine defaults.
    pub fn external_config(&self) -> &Config {
        &self.config
    }

    /// The configuration problem recorded during the build, if any.
    /// Callers relying on configuration-derived paths should check this.
    pub fn error(&self) -> Option<&ConfigError> {
        self.error.as_ref()
    }

    pub fn has_internal_repository(&self) -> bool {
        self.layout.has_internal_repository
    }

    /// Ordered union of the external and internal repositories.
    pub fn repository(&self) -> &CompositeRepository {
        &self.repository
    }

    pub fn external_repository(&self) -> &InstalledRepository {
        &self.external_repository
    }

    pub fn internal_repository(&self) -> &CompositeRepository {
        &self.internal_repository
    }

    /// The first canonical record matching `name`, preferring the external
    /// layer. Unknown names are not an error.
    pub fn find_package(&self, name: &str) -> Option<&PackageRecord> {
        find_package(self.repository.as_ref(), name)
    }

    /// All canonical records matching `name`, in first-seen order.
    pub fn canonical_packages(&self, name: &str) -> Vec<&PackageRecord> {
        canonical_packages(self.repository.as_ref(), name)
    }

    /// Splice the external project's autoload data in front of the host's
    /// own loader hook.
    ///
    /// Only applies when an internal repository exists and the external
    /// install directory carries a generated bootstrap. The host hook is
    /// re-registered in prepend mode on every path, including bootstrap
    /// failure. Callers should invoke this at most once per process;
    /// re-invocation re-runs the bootstrap.
    #[tracing::instrument(skip(self))]
    pub fn process_additional_autoloads(&self) -> Result<()> {
        if !self.layout.has_internal_repository {
            return Ok(());
        }

        let autoload = engine::autoload_path(&self.layout.external_install_dir);
        if !self.runtime.is_readable(&autoload) {
            debug!("No external autoload bootstrap at {:?}", autoload);
            return Ok(());
        }

        self.class_loader.unregister();
        let result = self
            .class_loader
            .load(&autoload)
            .with_context(|| format!("Failed to load autoload bootstrap {:?}", autoload));
        self.class_loader.register(true);
        result
    }

    /// Create an engine session for the external manifest.
    ///
    /// The resolved install directory is passed explicitly unless the
    /// user's manifest already overrides the setting, in which case the
    /// engine honors the manifest on its own.
    pub fn create_engine(&self, io: &mut dyn Io) -> Result<Box<dyn EngineSession>> {
        let install_dir = if self.layout.install_dir_overridden {
            None
        } else {
            Some(self.layout.external_install_dir.clone())
        };
        self.engine
            .create_session(io, &self.layout.external_manifest_path, install_dir)
    }

    /// Create an engine installer. When an internal repository exists it is
    /// handed to the engine as an additional installed repository.
    pub fn create_installer(&self, io: &mut dyn Io) -> Result<Box<dyn Installer>> {
        let session = self.create_engine(io)?;
        let additional = self
            .layout
            .has_internal_repository
            .then(|| self.internal_repository.as_ref());
        session.create_installer(io, additional)
    }
}
