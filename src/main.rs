//! lineage-sync - dbt Lineage Loader
//!
//! dbt のリネージ Parquet ファイルを BigQuery にロード

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use anyhow::Result;
use clap::Parser;

use lineage_sync::adapter::config::Config;
use lineage_sync::driver::{Args, LineageWorkflow};

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    // Load configuration (implicit default file is optional, environment wins)
    let config = Config::load(args.config.as_deref())?;

    // Create workflow with injected dependencies
    let workflow = LineageWorkflow::new(config);

    workflow.execute(args).await
}
