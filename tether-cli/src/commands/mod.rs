//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod actors;
mod output;
mod run;

pub use actors::ActorCommands;
pub use run::RunArgs;

use anyhow::Result;
use clap::Subcommand;
use tether_client::ClientError;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Actor catalog
    Actors {
        #[command(subcommand)]
        command: ActorCommands,
    },
    /// Run an actor and follow it to completion
    Run(RunArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Actors { command } => actors::handle_actor_command(command, config).await,
        Commands::Run(args) => run::handle_run(args, config).await,
    }
}

/// A suggestion for a failed command, if the failure came from the API
pub fn hint(err: &anyhow::Error) -> Option<&'static str> {
    let client_err = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClientError>())?;

    if client_err.is_unauthorized() {
        Some("The API token was rejected; check --token or APIFY_TOKEN.")
    } else if client_err.is_not_found() {
        Some("Check the actor id; `tether actors list` shows the available actors.")
    } else {
        None
    }
}
