//! Engine lifecycle hook that records the host's own package identity.
//!
//! The engine's event system invokes this after regenerating autoload data.
//! Writing the currently-building package into the root-package record file
//! makes the host discoverable through the same repository queries as real
//! dependencies, without being a real dependency entry.

use anyhow::{Context, Result};
use std::path::Path;

use crate::engine::{Io, root_package_path};
use crate::package::PackageRecord;
use crate::runtime::Runtime;

/// Payload of the post-autoload-dump lifecycle event.
pub struct AutoloadDumpEvent<'a> {
    /// The package currently being built (the host itself).
    pub package: &'a PackageRecord,
    /// Install directory the event ran against.
    pub install_dir: &'a Path,
}

/// Write (or overwrite) the synthetic root-package record for `event`,
/// creating parent directories as needed.
#[tracing::instrument(skip(runtime, event, io))]
pub fn post_autoload_dump<R: Runtime>(
    runtime: &R,
    event: &AutoloadDumpEvent<'_>,
    io: &mut dyn Io,
) -> Result<()> {
    let path = root_package_path(event.install_dir);

    io.write_line(&format!(
        "Adding {} ({}) to {}",
        event.package.name(),
        event.package.pretty_version(),
        path.display()
    ));

    if let Some(parent) = path.parent()
        && !runtime.exists(parent)
    {
        runtime.create_dir_all(parent)?;
    }

    let records = [event.package.clone()];
    let contents = serde_json::to_string_pretty(&records)?;
    runtime
        .write(&path, contents.as_bytes())
        .with_context(|| format!("Failed to write root package record to {:?}", path))
}
