//! Adapter Layer
//!
//! 外部システム（BigQuery, dbt Metadata API, ファイルシステム）との統合

pub mod auth;
pub mod bigquery;
pub mod config;
pub mod dbt;
pub mod repositories;
