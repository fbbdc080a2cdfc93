//! Terminal rendering shared by the command handlers

use colored::*;
use tether_core::domain::run::{RunState, RunStatus};
use tether_core::domain::schema::InputSchema;
use tether_session::{BoundInputs, BoundValue, SchemaOutcome};

/// Colorize run status for display
pub fn colorize_status(status: RunStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        RunStatus::Starting => status_str.yellow(),
        RunStatus::Running => status_str.cyan(),
        RunStatus::Succeeded => status_str.green(),
        RunStatus::Failed => status_str.red(),
        RunStatus::Aborted => status_str.dimmed(),
    }
}

/// Print the inferred input form, with seeded values
pub fn print_schema(outcome: &SchemaOutcome, seeded: &BoundInputs) {
    match outcome {
        SchemaOutcome::Unavailable { reason } => {
            println!("{} {}", "Input schema unavailable:".yellow(), reason);
            println!(
                "{}",
                "  Pass the whole input with --json '{...}' instead.".dimmed()
            );
        }
        SchemaOutcome::Declared(schema) | SchemaOutcome::Inferred(schema) => {
            println!(
                "{}",
                format!("Input ({} field(s), from {}):", schema.len(), outcome.source()).bold()
            );
            print_fields(schema, seeded);
        }
    }
}

fn print_fields(schema: &InputSchema, seeded: &BoundInputs) {
    if schema.is_empty() {
        println!("{}", "  (no fields)".dimmed());
        return;
    }

    for field in schema.fields() {
        let descriptor = &field.descriptor;
        let marker = if descriptor.required { "*" } else { " " };
        println!(
            "  {}{} ({})",
            field.name.cyan(),
            marker.red(),
            descriptor.field_type
        );
        if let Some(text) = descriptor.title.as_ref().or(descriptor.description.as_ref()) {
            println!("      {}", text.dimmed());
        }
        if let Some(value) = seeded.get(&field.name) {
            if !is_blank(value) {
                println!("      default: {}", render_value(value));
            }
        }
    }
}

fn is_blank(value: &BoundValue) -> bool {
    match value {
        BoundValue::Text(text) => text.is_empty(),
        BoundValue::List(items) => items.is_empty(),
        BoundValue::Flag(_) | BoundValue::Opaque(_) => false,
    }
}

fn render_value(value: &BoundValue) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

/// Print one run snapshot
pub fn print_state(state: &RunState) {
    let mut line = format!(
        "{} Run {} {}",
        state.updated_at.format("%H:%M:%S").to_string().dimmed(),
        state.run_id.dimmed(),
        colorize_status(state.status)
    );
    if let Some(message) = &state.status_message {
        line.push_str(&format!(" - {}", message));
    }
    println!("{}", line);
}

/// Print the final results of a run as pretty JSON
pub fn print_results(results: &[serde_json::Value]) {
    println!("\n{}", format!("Final Results ({} item(s)):", results.len()).bold());
    match serde_json::to_string_pretty(results) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{:?}", results),
    }
}
