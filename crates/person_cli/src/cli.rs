use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "person-sync")]
#[command(about = "Person store with CRM contact synchronization")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, short, default_value = "person-sync.json")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database and provision the sync metadata record.
    Init,
    /// Pull contacts from the CRM once and reconcile.
    Sync,
    /// Reconcile periodically until stopped or a commit conflict occurs.
    Watch {
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
        /// Stop after this many runs.
        #[arg(long)]
        max_runs: Option<u64>,
    },
    /// Print every person as JSON.
    List,
    Get {
        id: String,
    },
    /// Create a person from a JSON payload.
    Create {
        #[arg(long)]
        json: String,
    },
    /// Replace a person's contact fields from a JSON payload.
    Update {
        id: String,
        #[arg(long)]
        json: String,
    },
    Delete {
        id: String,
    },
    /// Print the last successful sync time (epoch ms).
    LastSync {
        /// Re-read the persisted value instead of the startup snapshot.
        #[arg(long)]
        reload: bool,
    },
}
