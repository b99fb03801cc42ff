//! Package records and repositories.
//!
//! This module provides the installed-package data model: records as
//! reported by the package engine's metadata files, repositories that hold
//! them, and canonical-name resolution across layered repositories.

mod record;
mod repository;
mod resolve;

pub use record::PackageRecord;
pub use repository::{CompositeRepository, InstalledRepository, Repository};
pub use resolve::{canonical_packages, find_package, resolve_canonical};
