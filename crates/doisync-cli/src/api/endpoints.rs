//! API endpoint URL builders

use doisync_common::types::Doi;

/// Base path of one DOI; the suffix is percent-encoded as one segment.
fn doi_url(base_url: &str, doi: &Doi) -> String {
    format!(
        "{}/api/v1/doi/{}/{}",
        base_url,
        doi.prefix(),
        urlencoding::encode(doi.suffix())
    )
}

/// Build record URL
pub fn record_url(base_url: &str, doi: &Doi) -> String {
    doi_url(base_url, doi)
}

/// Build diagnostics URL
pub fn diagnostics_url(base_url: &str, doi: &Doi) -> String {
    format!("{}/diagnostics", doi_url(base_url, doi))
}

/// Build export URL
pub fn export_url(base_url: &str, doi: &Doi) -> String {
    format!("{}/export", doi_url(base_url, doi))
}

/// Build re-run URL
pub fn rerun_url(base_url: &str, doi: &Doi) -> String {
    format!("{}/rerun", doi_url(base_url, doi))
}

/// Build FAILED listing URL
pub fn failed_url(base_url: &str) -> String {
    format!("{}/api/v1/doi/failed", base_url)
}

/// Build health check URL
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url)
}
