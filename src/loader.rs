//! Host class-loading contract.
//!
//! The host application owns its own bootstrap/class-loading mechanism;
//! this crate only needs the narrow register/unregister/load surface to
//! splice the external project's autoload data in front of the host's own.

use anyhow::Result;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
pub trait ClassLoader: Send + Sync {
    /// Register the loader's lookup hook. With `prepend` the hook takes
    /// precedence over hooks registered earlier.
    fn register(&self, prepend: bool);

    /// Remove the loader's lookup hook.
    fn unregister(&self);

    /// Execute an autoload bootstrap file, registering the mappings it
    /// declares.
    fn load(&self, path: &Path) -> Result<()>;
}
