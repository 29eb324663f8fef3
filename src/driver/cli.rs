//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{Parser, Subcommand};

/// dbtリネージのParquetファイルをBigQueryにロードするCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "lineage-sync")]
#[command(about = "Load dbt lineage Parquet files into BigQuery", long_about = None)]
pub struct Args {
    /// Dry run mode - validate inputs without contacting any service
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Config file path (defaults to ./lineage-sync.json when present;
    /// an explicit path must exist). Environment variables take precedence
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// 実行するコマンド
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Load the lineage Parquet files into BigQuery (default)
    Load,
    /// Fetch lineage from the dbt Cloud Metadata API and write the Parquet files
    Extract,
    /// Extract, then load the files written by this run
    Sync,
}

impl Args {
    /// 省略時は `load`
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Load)
    }
}
