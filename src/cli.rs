//! CLI module for the analytics service
//!
//! Provides a command-line interface for running the server and for
//! aggregating a contract dump offline without starting HTTP.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CRM contract analytics service
#[derive(Parser)]
#[command(name = "crm-analytics")]
#[command(about = "Contract analytics service for the trading CRM", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the analytics server (default if no command specified)
    Serve,

    /// Aggregate a JSON file of contract records and print the report
    Aggregate {
        /// Path to a JSON array of contract records
        #[arg(long)]
        input: PathBuf,

        /// Time period filter: 30d, 90d, 6m, 12m, ytd, all
        #[arg(long, default_value = "all")]
        period: String,
    },
}
