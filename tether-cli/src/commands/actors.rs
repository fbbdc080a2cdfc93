//! Actor command handlers
//!
//! Handles listing the actor catalog and showing the input form inferred
//! for one actor.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use tether_core::domain::job::{JobDefinition, JobSummary};
use tether_session::{InputBinder, SchemaInferenceEngine};

use super::output::print_schema;
use crate::config::Config;

/// Actor subcommands
#[derive(Subcommand)]
pub enum ActorCommands {
    /// List available actors
    List,
    /// Show an actor's input form
    Schema {
        /// Actor ID or username/name
        id: String,
    },
}

/// Handle actor commands
pub async fn handle_actor_command(command: ActorCommands, config: &Config) -> Result<()> {
    match command {
        ActorCommands::List => list_actors(config).await,
        ActorCommands::Schema { id } => show_schema(config, &id).await,
    }
}

/// List all actors
async fn list_actors(config: &Config) -> Result<()> {
    let actors = config.gateway()?.list_job_definitions().await?;

    if actors.is_empty() {
        println!("{}", "No actors found.".yellow());
    } else {
        println!("{}", format!("Found {} actor(s):", actors.len()).bold());
        println!();
        for actor in &actors {
            print_actor_summary(actor);
        }
    }

    Ok(())
}

/// Fetch an actor, infer its schema and print the form
async fn show_schema(config: &Config, id: &str) -> Result<()> {
    let definition = config.gateway()?.get_job_definition(id).await?;
    print_actor_details(&definition);

    let outcome = SchemaInferenceEngine::from_config(&config.session).infer_definition(&definition)?;
    let seeded = match outcome.schema() {
        Some(schema) => InputBinder::new(schema.clone()).seed(),
        None => Default::default(),
    };

    println!();
    print_schema(&outcome, &seeded);

    Ok(())
}

fn print_actor_summary(actor: &JobSummary) {
    println!("  {} {} {}", "▸".cyan(), actor.name.bold(), actor.id.dimmed());
    if let Some(description) = &actor.description {
        println!("    {}", description);
    }
    println!();
}

fn print_actor_details(definition: &JobDefinition) {
    println!("{}", "Actor Details:".bold());
    println!("  ID:          {}", definition.id.cyan());
    println!("  Name:        {}", definition.name);
    if let Some(description) = &definition.description {
        println!("  Description: {}", description);
    }
    println!(
        "  Declared schema: {}",
        if definition.declared_schema.is_some() {
            "yes".green()
        } else {
            "no".dimmed()
        }
    );
    println!(
        "  Example input:   {}",
        if definition.example_input.is_some() {
            "yes".green()
        } else {
            "no".dimmed()
        }
    );
}
