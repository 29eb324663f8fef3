//! # Project Value Objects
//!
//! プロジェクトIDとプロジェクトコンテキスト

use std::fmt;

use crate::domain::error::LoadError;

/// GCPプロジェクトID
///
/// 空文字（空白のみを含む）は受け付けない
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    /// 文字列からプロジェクトIDを作成します。
    ///
    /// 前後の空白は取り除かれます。
    ///
    /// # 例
    ///
    /// ```
    /// use lineage_sync::domain::entities::project::ProjectId;
    ///
    /// let id = ProjectId::parse(" my-project ").unwrap();
    /// assert_eq!(id.as_str(), "my-project");
    ///
    /// assert!(ProjectId::parse("   ").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LoadError::InvalidProject(
                "project identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// プロジェクトコンテキスト
///
/// `configure_context` が返し、各ロード呼び出しに明示的に渡される。
/// プロセス全体の状態は変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// ロード先のデフォルトプロジェクト
    pub project_id: ProjectId,
    /// API利用の課金先プロジェクト
    pub quota_project_id: ProjectId,
    /// ジョブのロケーション（例: "US", "asia-northeast1"）
    pub location: Option<String>,
}

impl ProjectContext {
    /// 同じプロジェクトをデフォルトかつクォータプロジェクトとするコンテキストを作成
    pub fn for_project(project_id: ProjectId, location: Option<String>) -> Self {
        Self {
            quota_project_id: project_id.clone(),
            project_id,
            location,
        }
    }
}
