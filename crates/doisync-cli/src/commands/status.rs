//! `doisync status` command implementation
//!
//! Shows the local record next to what DataCite holds.

use crate::api::client::ApiClient;
use crate::api::types::Diagnostics;
use crate::error::Result;
use crate::OutputFormat;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use doisync_common::types::Doi;

pub async fn run(client: &ApiClient, doi: &Doi, format: OutputFormat) -> Result<()> {
    let diagnostics = client.diagnose(doi).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diagnostics)?),
        OutputFormat::Table => print_table(&diagnostics),
    }

    Ok(())
}

fn print_table(diagnostics: &Diagnostics) {
    println!("{}", diagnostics.doi.to_string().bold());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["", "Local", "DataCite"]);

    let record = diagnostics.record.as_ref();
    let remote = diagnostics.remote.as_ref();

    table.add_row(vec![
        "Status".to_string(),
        record.map_or("-".to_string(), |r| r.status.to_string()),
        remote.map_or("unknown".to_string(), |r| r.status.to_string()),
    ]);
    table.add_row(vec![
        "Target".to_string(),
        record
            .and_then(|r| r.target.clone())
            .unwrap_or_else(|| "-".to_string()),
        remote
            .and_then(|r| r.target.clone())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    if let Some(record) = record {
        table.add_row(vec![
            "Type".to_string(),
            record.kind.to_string(),
            String::new(),
        ]);
        table.add_row(vec![
            "Owner".to_string(),
            record.owner_key.clone().unwrap_or_else(|| "-".to_string()),
            String::new(),
        ]);
        table.add_row(vec![
            "Modified".to_string(),
            record.modified.to_rfc3339(),
            String::new(),
        ]);
    }

    println!("{}", table);
    println!("Target matches:   {}", verdict(diagnostics.target_matches));
    println!("Metadata matches: {}", verdict(diagnostics.metadata_matches));

    if in_sync(diagnostics) {
        println!("{}", "In sync".green());
    } else {
        println!("{}", "Out of sync".red());
    }
}

fn verdict(matches: Option<bool>) -> String {
    match matches {
        Some(true) => "yes".green().to_string(),
        Some(false) => "no".red().to_string(),
        None => "n/a".dimmed().to_string(),
    }
}

fn in_sync(diagnostics: &Diagnostics) -> bool {
    match (&diagnostics.record, &diagnostics.remote) {
        (Some(record), Some(remote)) => {
            record.status == remote.status
                && diagnostics.target_matches.unwrap_or(true)
                && diagnostics.metadata_matches.unwrap_or(true)
        },
        _ => false,
    }
}
