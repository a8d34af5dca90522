//! `doisync rerun` command implementation

use crate::api::client::ApiClient;
use crate::error::{CliError, Result};
use colored::Colorize;
use doisync_common::types::Doi;

pub async fn run(client: &ApiClient, doi: &Doi) -> Result<()> {
    let result = client.rerun(doi).await?;

    if result.outcome == "FAILED" {
        return Err(CliError::RerunFailed(result.doi.to_string()));
    }

    println!("{} {}", result.doi, result.outcome.green());
    Ok(())
}
