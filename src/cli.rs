//! Command-line interface definitions for mlbb_ingest.
//!
//! Global options can be provided via flags or environment variables and
//! override the YAML config file.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scrape MLBB hero pages and upload them to the hero database.
///
/// # Examples
///
/// ```sh
/// # Scrape up to 20 heroes, 4 at a time
/// mlbb_ingest scrape 20 4
///
/// # Resume where the last run stopped, then summarize
/// mlbb_ingest continue
/// mlbb_ingest report
///
/// # Upload to the deployed D1 database
/// mlbb_ingest --remote upload
///
/// # Upload into a local SQLite mirror instead
/// mlbb_ingest --sqlite ./heroes.db upload
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true, env = "MLBB_CONFIG")]
    pub config: Option<String>,

    /// Directory holding heroes-data.json and the other outputs
    #[arg(short, long, global = true, env = "MLBB_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write into this SQLite file instead of D1
    #[arg(long, global = true, env = "MLBB_SQLITE")]
    pub sqlite: Option<PathBuf>,

    /// D1 database name for `wrangler d1 execute`
    #[arg(long, global = true, env = "MLBB_D1_DATABASE")]
    pub database: Option<String>,

    /// Target the deployed D1 database instead of the local one
    #[arg(long, global = true)]
    pub remote: bool,

    /// Base URL of the hero HTTP API
    #[arg(long, global = true, env = "MLBB_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Discover heroes and scrape their pages in batches
    Scrape {
        /// Maximum number of heroes to attempt in this run
        max_heroes: Option<usize>,
        /// Heroes scraped concurrently per batch
        batch_size: Option<usize>,
        /// Start a new run instead of resuming the persisted one
        #[arg(long)]
        fresh: bool,
    },
    /// Resume the persisted run with the larger `continue` budget
    Continue,
    /// Summarize the persisted run
    Report,
    /// Check that the upload targets are reachable
    Test,
    /// Upload the persisted run
    Upload {
        /// Heroes per upload batch
        batch_size: Option<usize>,
        #[arg(long, value_enum, default_value_t = UploadTarget::All)]
        target: UploadTarget,
    },
    /// Write a standalone SQL import script for the persisted run
    Sql,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// Identities, then every facet
    All,
    /// Only the `heroes` rows
    Identities,
    /// Only facet rows for heroes already in the database
    Facets,
    /// Heroes and abilities through the HTTP API
    Api,
}
