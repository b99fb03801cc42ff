use anyhow::Result;

use crate::embedded::EmbeddedComposerAware;
use crate::engine::Io;
use crate::runtime::Runtime;

/// Lifecycle event dispatched before regenerating the autoloader.
const DUMP_AUTOLOAD_EVENT: &str = "dump-autoload";

#[derive(clap::Args, Debug)]
pub struct DumpAutoloadArgs {
    /// Optimize the generated autoload data, good for production
    #[arg(long, short = 'o')]
    pub optimize: bool,
}

/// Regenerate the external project's autoload bootstrap.
#[tracing::instrument(skip(app, io, args))]
pub fn dump_autoload<R, A>(app: &A, io: &mut dyn Io, args: &DumpAutoloadArgs) -> Result<()>
where
    R: Runtime,
    A: EmbeddedComposerAware<R>,
{
    let composer = app.embedded_composer();
    let session = composer.create_engine(io)?;
    session.dispatch(DUMP_AUTOLOAD_EVENT, io)?;
    session.dump_autoload(args.optimize)
}
