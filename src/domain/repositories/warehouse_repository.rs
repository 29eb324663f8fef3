//! # Warehouse Repository Trait
//!
//! データウェアハウスへのコンテキスト設定とテーブルロードを抽象化

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::load_job::{LoadJobReceipt, LoadJobSpec};
use crate::domain::entities::project::{ProjectContext, ProjectId};
use crate::domain::error::LoadError;

/// ウェアハウスリポジトリ
///
/// 外部のロードサービスに対する2つの操作を提供する
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WarehouseRepository: Send + Sync {
    /// プロジェクトをクォータプロジェクト兼デフォルトプロジェクトとして設定する
    ///
    /// # Errors
    ///
    /// * `LoadError::Authentication` - 有効な認証情報がない
    /// * `LoadError::InvalidProject` - プロジェクトが認識されない
    async fn configure_context(&self, project_id: &ProjectId) -> Result<ProjectContext, LoadError>;

    /// ソースファイルを宛先テーブルにロードする
    ///
    /// # Errors
    ///
    /// * `LoadError::FileNotFound` - ソースファイルが存在しない（サービスには何も送らない）
    /// * `LoadError::SchemaMismatch` - スキーマ非互換
    /// * `LoadError::LoadJobFailure` - その他の拒否
    async fn load_table(
        &self,
        context: &ProjectContext,
        job: &LoadJobSpec,
    ) -> Result<LoadJobReceipt, LoadError>;
}
