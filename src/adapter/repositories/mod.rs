//! Repository Implementations
//!
//! Domain層のRepositoryトレイトの実装

pub mod bigquery_warehouse_repository;
pub mod dbt_lineage_repository;
pub mod parquet_lineage_repository;
