//! # Extract Lineage Use Case
//!
//! dbtリネージ抽出ユースケース

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::entities::lineage::ColumnLineage;
use crate::domain::repositories::lineage_repository::{LineageSource, LineageWriter};

/// 抽出結果のサマリー
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    /// 書き出したモデル行数
    pub model_rows: usize,
    /// 書き出したカラム行数
    pub column_rows: usize,
    /// カラムリネージ取得に失敗したモデル
    pub failed_models: Vec<String>,
    /// 今回書き出したファイル
    pub written_files: Vec<PathBuf>,
}

/// 出力先ファイル
#[derive(Debug, Clone)]
pub struct ExtractTargets {
    pub model_lineage_path: PathBuf,
    pub column_lineage_path: PathBuf,
}

/// リネージ抽出ユースケース
///
/// モデルリネージを取得して書き出し、各モデルのカラムリネージを集約して書き出す
pub struct ExtractLineageUseCase<S: LineageSource + ?Sized, W: LineageWriter + ?Sized> {
    source: Arc<S>,
    writer: Arc<W>,
}

impl<S: LineageSource + ?Sized, W: LineageWriter + ?Sized> ExtractLineageUseCase<S, W> {
    /// 新しいユースケースを作成
    pub fn new(source: Arc<S>, writer: Arc<W>) -> Self {
        Self { source, writer }
    }

    /// リネージを抽出してファイルに書き出す
    ///
    /// # Errors
    ///
    /// モデルリネージの取得、またはファイルの書き出しに失敗した場合にエラーを返す。
    /// モデル単位のカラムリネージ取得失敗はログに残してスキップする。
    pub async fn execute(&self, targets: &ExtractTargets) -> Result<ExtractSummary> {
        let mut summary = ExtractSummary::default();

        let models = self
            .source
            .fetch_model_lineage()
            .await
            .context("Failed to fetch model lineage")?;

        if models.is_empty() {
            warn!("No models found in the environment");
            return Ok(summary);
        }

        summary.model_rows = self
            .writer
            .write_model_lineage(&targets.model_lineage_path, &models)
            .await?;
        summary
            .written_files
            .push(targets.model_lineage_path.clone());
        info!(
            "Model lineage saved to {} ({} rows)",
            targets.model_lineage_path.display(),
            summary.model_rows
        );

        let mut columns: Vec<ColumnLineage> = Vec::new();
        for node_id in models.iter().filter_map(|m| m.queryable_node_id()) {
            match self.source.fetch_column_lineage(node_id).await {
                Ok(rows) => columns.extend(rows),
                Err(e) => {
                    warn!("Error processing model: {} : {:#}", node_id, e);
                    summary.failed_models.push(node_id.to_string());
                }
            }
        }

        if columns.is_empty() {
            info!("No column lineage data found");
            return Ok(summary);
        }

        summary.column_rows = self
            .writer
            .write_column_lineage(&targets.column_lineage_path, &columns)
            .await?;
        summary
            .written_files
            .push(targets.column_lineage_path.clone());
        info!(
            "Column lineage saved to {} ({} rows)",
            targets.column_lineage_path.display(),
            summary.column_rows
        );

        Ok(summary)
    }
}
