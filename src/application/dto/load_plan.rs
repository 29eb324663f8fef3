//! # Load Plan DTO
//!
//! ロード計画のData Transfer Object

use std::path::{Path, PathBuf};

use crate::domain::entities::load_job::{LoadJobSpec, SourceFormat, TableRef};

/// モデルリネージの既定テーブル名
pub const MODEL_LINEAGE_TABLE: &str = "dbt_model_lineage";
/// カラムリネージの既定テーブル名
pub const COLUMN_LINEAGE_TABLE: &str = "dbt_column_lineage";

/// ロード計画
///
/// 順番に実行されるロードジョブのリスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub jobs: Vec<LoadJobSpec>,
}

impl LoadPlan {
    pub fn new(jobs: Vec<LoadJobSpec>) -> Self {
        Self { jobs }
    }

    /// リネージ2テーブルのロード計画を作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use lineage_sync::application::dto::load_plan::LoadPlan;
    ///
    /// let plan = LoadPlan::lineage(
    ///     "lineage",
    ///     "dbt_model_lineage.parquet",
    ///     "dbt_column_lineage.parquet",
    /// );
    ///
    /// assert_eq!(plan.jobs.len(), 2);
    /// assert_eq!(plan.jobs[0].destination.to_string(), "lineage.dbt_model_lineage");
    /// assert_eq!(plan.jobs[1].destination.to_string(), "lineage.dbt_column_lineage");
    /// ```
    pub fn lineage(
        dataset: &str,
        model_lineage_path: impl Into<PathBuf>,
        column_lineage_path: impl Into<PathBuf>,
    ) -> Self {
        Self::new(vec![
            LoadJobSpec::new(
                model_lineage_path,
                TableRef::new(dataset, MODEL_LINEAGE_TABLE),
                SourceFormat::Parquet,
            ),
            LoadJobSpec::new(
                column_lineage_path,
                TableRef::new(dataset, COLUMN_LINEAGE_TABLE),
                SourceFormat::Parquet,
            ),
        ])
    }

    /// 指定したソースファイルを持つジョブだけを残す
    pub fn retain_sources(self, sources: &[PathBuf]) -> Self {
        let jobs = self
            .jobs
            .into_iter()
            .filter(|job| sources.iter().any(|s| s == &job.source_path))
            .collect();
        Self::new(jobs)
    }

    /// 存在しないソースファイルを返す
    pub fn missing_sources(&self) -> Vec<&Path> {
        self.jobs
            .iter()
            .map(|job| job.source_path.as_path())
            .filter(|path| !path.is_file())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
