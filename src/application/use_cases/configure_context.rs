//! # Configure Context Use Case
//!
//! プロジェクトコンテキスト設定ユースケース

use log::info;
use std::sync::Arc;

use crate::domain::entities::project::{ProjectContext, ProjectId};
use crate::domain::error::LoadError;
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

/// コンテキスト設定ユースケース
///
/// プロジェクトIDを検証し、ロードに使うコンテキストを確立する
pub struct ConfigureContextUseCase<R: WarehouseRepository + ?Sized> {
    warehouse: Arc<R>,
}

impl<R: WarehouseRepository + ?Sized> ConfigureContextUseCase<R> {
    /// 新しいユースケースを作成
    pub fn new(warehouse: Arc<R>) -> Self {
        Self { warehouse }
    }

    /// プロジェクトコンテキストを設定する
    ///
    /// # Arguments
    ///
    /// * `raw_project_id` - 外部から与えられたプロジェクトID
    ///
    /// # Errors
    ///
    /// 空のIDは外部サービスを呼ぶ前に `LoadError::InvalidProject` になる
    pub async fn execute(&self, raw_project_id: &str) -> Result<ProjectContext, LoadError> {
        let project_id = ProjectId::parse(raw_project_id)?;
        info!("Configuring project context for {}", project_id);

        let context = self.warehouse.configure_context(&project_id).await?;
        info!(
            "Project context ready: project={}, quota_project={}",
            context.project_id, context.quota_project_id
        );
        Ok(context)
    }
}
