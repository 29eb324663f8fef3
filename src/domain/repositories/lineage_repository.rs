//! # Lineage Repository Traits
//!
//! リネージの取得と永続化を抽象化

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::lineage::{ColumnLineage, ModelLineage};

/// リネージの取得元（dbt Metadata API など）
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LineageSource: Send + Sync {
    /// 環境内の全モデルのリネージを取得する
    async fn fetch_model_lineage(&self) -> Result<Vec<ModelLineage>>;

    /// 指定モデルのカラムリネージを取得する
    async fn fetch_column_lineage(&self, node_unique_id: &str) -> Result<Vec<ColumnLineage>>;
}

/// リネージの書き出し先
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LineageWriter: Send + Sync {
    /// モデルリネージを書き出し、書いた行数を返す
    async fn write_model_lineage(&self, path: &Path, rows: &[ModelLineage]) -> Result<usize>;

    /// カラムリネージを書き出し、書いた行数を返す
    async fn write_column_lineage(&self, path: &Path, rows: &[ColumnLineage]) -> Result<usize>;
}
