//! `doisync list-failed` command implementation

use crate::api::client::ApiClient;
use crate::error::Result;
use crate::OutputFormat;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let records = client.list_failed().await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No FAILED DOIs.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["DOI", "Type", "Target", "Modified"]);

    for record in &records {
        table.add_row(vec![
            record.doi.to_string(),
            record.kind.to_string(),
            record.target.clone().unwrap_or_else(|| "-".to_string()),
            record.modified.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{}", table);
    println!("{} FAILED DOI(s)", records.len());
    Ok(())
}
