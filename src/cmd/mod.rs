//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`], [`validate`], or [`routes`].
//! Each handler lives in its own submodule.

pub mod init;
pub mod routes;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::PorticoError;

pub async fn dispatch(cli: Cli) -> Result<(), PorticoError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Routes(args)) => routes::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  portico v{version} \u{2014} lightweight reverse-proxy API gateway\n\n  \
         No command provided. To get started:\n\n    \
         portico init                  Generate a starter config\n    \
         portico run                   Start the gateway (auto-detects ./portico.yaml)\n    \
         portico run -c routes.yaml    Start with a specific config file\n    \
         portico --help                See all commands and options\n"
    );
}
