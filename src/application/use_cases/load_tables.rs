//! # Load Tables Use Case
//!
//! テーブルロードユースケース

use log::{info, warn};
use std::sync::Arc;

use crate::application::dto::load_plan::LoadPlan;
use crate::domain::entities::load_job::LoadJobReceipt;
use crate::domain::entities::project::ProjectContext;
use crate::domain::error::LoadError;
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

/// ロード結果のサマリー
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    /// 完了したジョブ（計画順）
    pub receipts: Vec<LoadJobReceipt>,
}

/// テーブルロードユースケース
///
/// 計画のジョブを順番に実行する。最初に失敗したジョブで中断し、
/// 残りのジョブは実行しない。
pub struct LoadTablesUseCase<R: WarehouseRepository + ?Sized> {
    warehouse: Arc<R>,
}

impl<R: WarehouseRepository + ?Sized> LoadTablesUseCase<R> {
    /// 新しいユースケースを作成
    pub fn new(warehouse: Arc<R>) -> Self {
        Self { warehouse }
    }

    /// 計画のジョブをすべてロードする
    ///
    /// # Arguments
    ///
    /// * `context` - `ConfigureContextUseCase` が返したコンテキスト
    /// * `plan` - ロード計画
    ///
    /// # Errors
    ///
    /// 最初に失敗したジョブのエラーをそのまま返す
    pub async fn execute(
        &self,
        context: &ProjectContext,
        plan: &LoadPlan,
    ) -> Result<LoadSummary, LoadError> {
        let mut receipts = Vec::with_capacity(plan.jobs.len());

        for (index, job) in plan.jobs.iter().enumerate() {
            info!(
                "Loading {} into {} ({})",
                job.source_path.display(),
                job.destination,
                job.format.api_name()
            );

            match self.warehouse.load_table(context, job).await {
                Ok(receipt) => {
                    info!("Load job {} finished for {}", receipt.job_id, receipt.destination);
                    receipts.push(receipt);
                }
                Err(e) => {
                    let skipped = plan.jobs.len() - index - 1;
                    if skipped > 0 {
                        warn!(
                            "{} while loading {}; skipping {} remaining load(s)",
                            e.kind(),
                            job.destination,
                            skipped
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(LoadSummary { receipts })
    }
}
