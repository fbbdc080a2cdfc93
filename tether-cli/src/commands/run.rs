//! Run command handler
//!
//! Binds the user's inputs to the actor's inferred form, submits a run and
//! renders every state transition until the run ends.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use tether_core::ProviderGateway;
use tether_core::domain::run::{RunState, RunStatus};
use tether_session::{
    BoundInputs, InputBinder, RunEvent, RunLifecycleTracker, SchemaInferenceEngine,
};
use tracing::debug;

use super::output::{print_results, print_state};
use crate::config::Config;

/// Arguments of `tether run`
#[derive(Args)]
pub struct RunArgs {
    /// Actor ID or username/name
    pub id: String,

    /// Input value as name=value (repeatable; lists split on commas or newlines)
    #[arg(short, long = "input", value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,

    /// Whole input as a JSON object, bypassing the inferred form
    #[arg(long, conflicts_with = "inputs")]
    pub json: Option<String>,

    /// Return as soon as the run is accepted
    #[arg(long)]
    pub no_wait: bool,
}

/// Submit a run and follow it
pub async fn handle_run(args: RunArgs, config: &Config) -> Result<()> {
    let gateway = config.gateway()?;

    let inputs = match &args.json {
        Some(raw) => parse_json_inputs(raw)?,
        None => bind_inputs(gateway.as_ref(), config, &args).await?,
    };

    let mut tracker = RunLifecycleTracker::new(gateway, &config.session);
    let mut handle = tracker.submit(&args.id, &inputs).await?;
    let run_id = handle.run_id().to_string();

    println!("{} {}", "Started run".bold(), run_id.cyan());
    if args.no_wait {
        return Ok(());
    }

    let mut shown: Option<RunState> = None;
    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(RunEvent::State(state)) => {
                    if shown.as_ref().is_none_or(|prev| status_changed(prev, &state)) {
                        print_state(&state);
                    }
                    if let Some(results) = &state.final_results {
                        print_results(results);
                    }
                    shown = Some(state);
                }
                Some(RunEvent::Halted(err)) => {
                    println!("{}", format!("Tracking stopped ({})", err.kind()).red());
                    return Err(err.into());
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracker.cancel();
                println!(
                    "{}",
                    format!("Stopped watching run {}; it keeps running remotely.", run_id).yellow()
                );
                return Ok(());
            }
        }
    }

    match tracker.current() {
        Some(state) if matches!(state.status, RunStatus::Failed | RunStatus::Aborted) => {
            anyhow::bail!(
                "Actor run {}. Message: {}",
                state.status.to_string().to_lowercase(),
                state.status_message.as_deref().unwrap_or("N/A")
            )
        }
        _ => Ok(()),
    }
}

/// Build inputs from the actor's inferred form and the `--input` pairs
async fn bind_inputs(
    gateway: &dyn ProviderGateway,
    config: &Config,
    args: &RunArgs,
) -> Result<BoundInputs> {
    let definition = gateway.get_job_definition(&args.id).await?;
    let outcome = SchemaInferenceEngine::from_config(&config.session).infer_definition(&definition)?;
    if !outcome.is_available() {
        println!(
            "{}",
            "No input schema available; inputs are sent as plain text.".yellow()
        );
    }

    let binder = InputBinder::new(outcome.into_schema());
    let mut bound = binder.seed();
    for pair in &args.inputs {
        let (name, value) = parse_pair(pair)?;
        debug!("Binding input {}", name);
        binder.apply(&mut bound, name, value);
    }

    Ok(bound)
}

/// Whether `next` needs a status line of its own, rather than only adding results
fn status_changed(prev: &RunState, next: &RunState) -> bool {
    prev.status != next.status || prev.status_message != next.status_message
}

/// Splits `name=value`, keeping any further `=` in the value
fn parse_pair(pair: &str) -> Result<(&str, &str)> {
    let (name, value) = pair
        .split_once('=')
        .with_context(|| format!("Invalid input '{}', expected NAME=VALUE", pair))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Invalid input '{}', missing field name", pair);
    }
    Ok((name, value))
}

fn parse_json_inputs(raw: &str) -> Result<BoundInputs> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--json is not valid JSON")?;
    match value {
        serde_json::Value::Object(object) => Ok(BoundInputs::from_json(object)),
        _ => anyhow::bail!("--json must be a JSON object"),
    }
}
