//! Repositories of installed-package records.
//!
//! A repository is an ordered collection queryable by exact name. Lookups
//! return every matching record; duplicate suppression is the job of the
//! canonicalization step, never of storage.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::runtime::Runtime;

use super::PackageRecord;

/// An ordered collection of package records, queryable by exact name.
pub trait Repository: Send + Sync {
    /// Every record, in source order.
    fn packages(&self) -> Vec<&PackageRecord>;

    /// Every record whose declared name matches, in source order. Multiple
    /// matches occur when canonical and alias records share a name or when
    /// layered sources carry duplicates.
    fn find_packages(&self, name: &str) -> Vec<&PackageRecord>;
}

/// Repository of packages physically installed under one install directory,
/// loaded from the engine's `installed.json` metadata file.
pub struct InstalledRepository {
    source: PathBuf,
    packages: Vec<PackageRecord>,
}

impl InstalledRepository {
    pub fn new(source: impl Into<PathBuf>, packages: Vec<PackageRecord>) -> Self {
        Self {
            source: source.into(),
            packages,
        }
    }

    /// Load the installed-package list from `path`.
    ///
    /// An absent file yields an empty repository: a project may
    /// legitimately have zero installed dependencies. A present but
    /// unreadable or malformed file is an error.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.exists(path) {
            log::debug!("No installed metadata at {:?}, starting empty", path);
            return Ok(Self::new(path, Vec::new()));
        }

        let contents = runtime.read_to_string(path)?;
        let packages: Vec<PackageRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse installed metadata {:?}", path))?;

        Ok(Self::new(path, packages))
    }

    /// Path of the metadata file this repository was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

impl Repository for InstalledRepository {
    fn packages(&self) -> Vec<&PackageRecord> {
        self.packages.iter().collect()
    }

    fn find_packages(&self, name: &str) -> Vec<&PackageRecord> {
        self.packages
            .iter()
            .filter(|record| record.name() == name)
            .collect()
    }
}

/// An ordered list of child repositories queried as one. Lookup results are
/// the concatenation of each child's matches, preserving child order.
pub struct CompositeRepository {
    repositories: Vec<Arc<dyn Repository>>,
}

impl CompositeRepository {
    pub fn new(repositories: Vec<Arc<dyn Repository>>) -> Self {
        Self { repositories }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn add_repository(&mut self, repository: Arc<dyn Repository>) {
        self.repositories.push(repository);
    }

    pub fn repositories(&self) -> &[Arc<dyn Repository>] {
        &self.repositories
    }
}

impl Repository for CompositeRepository {
    fn packages(&self) -> Vec<&PackageRecord> {
        self.repositories
            .iter()
            .flat_map(|repository| repository.packages())
            .collect()
    }

    fn find_packages(&self, name: &str) -> Vec<&PackageRecord> {
        self.repositories
            .iter()
            .flat_map(|repository| repository.find_packages(name))
            .collect()
    }
}
