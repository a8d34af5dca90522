//! DOI sync CLI library
//!
//! Operator command-line interface for the DOI synchronization server.
//!
//! # Overview
//!
//! FAILED identifiers need a human. The `doisync` binary talks to the
//! server's HTTP API:
//!
//! - **Diagnostics**: compare the local record with DataCite (`doisync status`)
//! - **Failures**: list FAILED identifiers (`doisync list-failed`)
//! - **Export**: fetch the stored registration document (`doisync export`)
//! - **Re-run**: register the stored document again (`doisync rerun`)

pub mod api;
pub mod commands;
pub mod error;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand, ValueEnum};
use doisync_common::types::Doi;
use std::path::PathBuf;

/// doisync - DOI synchronization operator tool
#[derive(Parser, Debug)]
#[command(name = "doisync")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL
    #[arg(long, env = "DOISYNC_SERVER_URL", default_value = "http://localhost:8000", global = true)]
    pub server_url: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare the local record of a DOI with the registration service
    Status {
        /// DOI, e.g. 10.15468/dl.abc123
        doi: Doi,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List DOIs in FAILED status
    ListFailed {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print or save the stored registration document of a DOI
    Export {
        /// DOI to export
        doi: Doi,

        /// Write the document to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Register the stored document of a DOI again
    Rerun {
        /// DOI to re-run
        doi: Doi,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
