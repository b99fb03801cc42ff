use anyhow::Result;
use log::debug;

use crate::embedded::EmbeddedComposerAware;
use crate::engine::{InstallOptions, Io};
use crate::runtime::Runtime;

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Output the operations without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Force installation from package sources when possible
    #[arg(long)]
    pub prefer_source: bool,

    /// Enable installation of dev dependencies
    #[arg(long)]
    pub dev: bool,

    /// Skip execution of scripts defined in the manifest
    #[arg(long)]
    pub no_scripts: bool,

    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Packages to update; all packages when not provided
    #[arg(value_name = "PACKAGE")]
    pub packages: Vec<String>,

    #[command(flatten)]
    pub options: InstallArgs,
}

impl InstallArgs {
    fn to_options(&self, update: bool, update_allowlist: Vec<String>) -> InstallOptions {
        InstallOptions {
            dry_run: self.dry_run,
            verbose: self.verbose,
            prefer_source: self.prefer_source,
            dev_mode: self.dev,
            run_scripts: !self.no_scripts,
            update,
            update_allowlist,
        }
    }
}

/// Install the external project's dependencies.
#[tracing::instrument(skip(app, io, args))]
pub fn install<R, A>(app: &A, io: &mut dyn Io, args: &InstallArgs) -> Result<()>
where
    R: Runtime,
    A: EmbeddedComposerAware<R>,
{
    run_installer(app, io, args.to_options(false, Vec::new()))
}

/// Update the external project's dependencies, optionally restricted to a
/// package allowlist.
#[tracing::instrument(skip(app, io, args))]
pub fn update<R, A>(app: &A, io: &mut dyn Io, args: &UpdateArgs) -> Result<()>
where
    R: Runtime,
    A: EmbeddedComposerAware<R>,
{
    run_installer(app, io, args.options.to_options(true, args.packages.clone()))
}

fn run_installer<R, A>(app: &A, io: &mut dyn Io, options: InstallOptions) -> Result<()>
where
    R: Runtime,
    A: EmbeddedComposerAware<R>,
{
    debug!("Running engine installer with {:?}", options);
    let composer = app.embedded_composer();
    let mut installer = composer.create_installer(io)?;
    installer.run(&options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::{EmbeddedComposer, EmbeddedComposerBuilder};
    use crate::engine::NullIo;
    use crate::loader::MockClassLoader;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{SpyEngine, SpyLog, test_bundle_root, test_project_root};
    use clap::Parser;
    use mockall::predicate::eq;
    use std::sync::{Arc, Mutex};

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestCommands {
        Install(InstallArgs),
        Update(UpdateArgs),
    }

    struct TestApp {
        composer: EmbeddedComposer<MockRuntime>,
    }

    impl EmbeddedComposerAware<MockRuntime> for TestApp {
        fn embedded_composer(&self) -> &EmbeddedComposer<MockRuntime> {
            &self.composer
        }
    }

    fn test_app(log: Arc<Mutex<SpyLog>>) -> TestApp {
        let project = test_project_root();
        let bundle = test_bundle_root();
        let mut runtime = MockRuntime::new();

        runtime
            .expect_exists()
            .with(eq(project.join("pkg.json")))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(project.join("packages").join("pkg").join("installed.json")))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(bundle.join("pkg").join("installed.json")))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(bundle.join("pkg").join(".root_package.json")))
            .returning(|_| false);

        let mut builder = EmbeddedComposerBuilder::new(
            runtime,
            Arc::new(SpyEngine(log)),
            Arc::new(MockClassLoader::new()),
            bundle,
            Some(project),
        )
        .unwrap();

        TestApp {
            composer: builder.build().unwrap(),
        }
    }

    #[test]
    fn test_install_args_parsing() {
        let cli =
            TestCli::try_parse_from(["host", "install", "--dry-run", "--no-scripts"]).unwrap();
        match cli.command {
            TestCommands::Install(args) => {
                assert!(args.dry_run);
                assert!(args.no_scripts);
                assert!(!args.dev);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_update_args_parsing_with_allowlist() {
        let cli = TestCli::try_parse_from(["host", "update", "acme/a", "acme/b", "--dev"])
            .unwrap();
        match cli.command {
            TestCommands::Update(args) => {
                assert_eq!(args.packages, vec!["acme/a", "acme/b"]);
                assert!(args.options.dev);
            }
            _ => panic!("Expected Update command"),
        }
    }

    #[test]
    fn test_install_runs_engine_installer() {
        let log = Arc::new(Mutex::new(SpyLog::default()));
        let app = test_app(log.clone());

        let args = InstallArgs {
            dry_run: true,
            prefer_source: false,
            dev: false,
            no_scripts: true,
            verbose: false,
        };
        install(&app, &mut NullIo, &args).unwrap();

        let seen = log.lock().unwrap();
        assert_eq!(seen.installer_runs.len(), 1);
        let options = &seen.installer_runs[0];
        assert!(options.dry_run);
        assert!(!options.run_scripts);
        assert!(!options.update);
        assert!(options.update_allowlist.is_empty());
    }

    #[test]
    fn test_update_forwards_allowlist() {
        let log = Arc::new(Mutex::new(SpyLog::default()));
        let app = test_app(log.clone());

        let args = UpdateArgs {
            packages: vec!["acme/a".to_string()],
            options: InstallArgs {
                dry_run: false,
                prefer_source: true,
                dev: true,
                no_scripts: false,
                verbose: false,
            },
        };
        update(&app, &mut NullIo, &args).unwrap();

        let seen = log.lock().unwrap();
        assert_eq!(seen.installer_runs.len(), 1);
        let options = &seen.installer_runs[0];
        assert!(options.update);
        assert!(options.prefer_source);
        assert!(options.dev_mode);
        assert!(options.run_scripts);
        assert_eq!(options.update_allowlist, vec!["acme/a"]);
    }
}
