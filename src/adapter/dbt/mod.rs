//! dbt Cloud Metadata API Adapter Modules

pub mod client;
pub mod models;
