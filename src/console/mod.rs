//! Console glue for hosts that expose dependency subcommands.
//!
//! Hosts wire these into their own clap command tree; the functions only
//! translate arguments into engine calls through the facade obtained from
//! an [`EmbeddedComposerAware`](crate::embedded::EmbeddedComposerAware)
//! application.

mod dump_autoload;
mod install;

pub use dump_autoload::{DumpAutoloadArgs, dump_autoload};
pub use install::{InstallArgs, UpdateArgs, install, update};
