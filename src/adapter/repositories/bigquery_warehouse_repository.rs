//! BigQuery Warehouse Repository Implementation
//!
//! WarehouseRepositoryのBigQuery実装

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::bigquery::client::BigQueryJobApi;
use crate::adapter::bigquery::load_job::{run_load_job, JOB_POLL_INTERVAL_MS};
use crate::domain::entities::load_job::{LoadJobReceipt, LoadJobSpec};
use crate::domain::entities::project::{ProjectContext, ProjectId};
use crate::domain::error::LoadError;
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

/// BigQueryウェアハウスリポジトリ
pub struct BigQueryWarehouseRepository {
    api: Arc<dyn BigQueryJobApi>,
    location: Option<String>,
    poll_interval: Duration,
}

impl BigQueryWarehouseRepository {
    /// 新しいリポジトリを作成
    pub fn new(api: Arc<dyn BigQueryJobApi>, location: Option<String>) -> Self {
        Self {
            api,
            location,
            poll_interval: Duration::from_millis(JOB_POLL_INTERVAL_MS),
        }
    }

    /// ジョブ状態のポーリング間隔を変更する
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl WarehouseRepository for BigQueryWarehouseRepository {
    async fn configure_context(&self, project_id: &ProjectId) -> Result<ProjectContext, LoadError> {
        self.api.check_project(project_id).await?;
        info!("Project {} is reachable", project_id);
        Ok(ProjectContext::for_project(
            project_id.clone(),
            self.location.clone(),
        ))
    }

    async fn load_table(
        &self,
        context: &ProjectContext,
        job: &LoadJobSpec,
    ) -> Result<LoadJobReceipt, LoadError> {
        run_load_job(self.api.as_ref(), context, job, self.poll_interval).await
    }
}
