//! `doisync export` command implementation
//!
//! Writes the stored document to stdout or a file. For FAILED records the
//! stored text may be the failure report instead of XML.

use crate::api::client::ApiClient;
use crate::error::Result;
use doisync_common::types::Doi;
use std::path::Path;

pub async fn run(client: &ApiClient, doi: &Doi, output: Option<&Path>) -> Result<()> {
    let document = client.export(doi).await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &document).await?;
            tracing::info!(%doi, path = %path.display(), "Document exported");
            eprintln!("Wrote {} bytes to {}", document.len(), path.display());
        },
        None => println!("{}", document),
    }

    Ok(())
}
