use colored::Colorize;
use serde_json::Value;
use stingray_core::{ChangeRecord, Outcome};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_outcome(outcome: &Outcome, format: OutputFormat) -> serde_json::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        OutputFormat::Table => print_as_table(outcome)?,
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_as_table(outcome: &Outcome) -> serde_json::Result<()> {
    let record = &outcome.record;
    match record.action_tag() {
        Some(tag) => print_success(&format!("{} {}", tag.yellow(), record.resource)),
        None => println!("{} {} unchanged", "•".dimmed(), record.resource),
    }

    if !record.changes.is_empty() {
        println!("{}", changes_table(record)?);
    }

    if let Some(nodes) = outcome
        .snapshot
        .as_ref()
        .and_then(|doc| doc.pointer("/properties/basic/nodes_table"))
        .and_then(Value::as_array)
    {
        if nodes.is_empty() {
            println!("No nodes in pool.");
        } else {
            println!("{}", nodes_table(nodes));
        }
    }
    Ok(())
}

fn changes_table(record: &ChangeRecord) -> serde_json::Result<String> {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Before", "After"]);
    for change in &record.changes {
        builder.push_record([
            change.path.clone(),
            serde_json::to_string(&change.before)?,
            serde_json::to_string(&change.after)?,
        ]);
    }
    Ok(builder.build().with(Style::rounded()).to_string())
}

fn nodes_table(nodes: &[Value]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Node", "State", "Weight", "Priority"]);
    for entry in nodes {
        let field = |key: &str| match entry.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "-".to_string(),
            Some(other) => other.to_string(),
        };
        builder.push_record([
            field("node"),
            field("state"),
            field("weight"),
            field("priority"),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}
