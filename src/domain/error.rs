//! # Load Errors
//!
//! ロード処理のエラー分類

use thiserror::Error;

/// ロード処理で発生するエラー
///
/// どのエラーも終端扱いで、リトライやリカバリは行わない。
/// メッセージには外部サービスが返した診断文言をそのまま載せる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// 有効な認証情報が得られない
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// プロジェクトIDが空、またはIDプロバイダに認識されない
    #[error("invalid project: {0}")]
    InvalidProject(String),

    /// ソースファイルが存在しない
    #[error("source file not found: {0}")]
    FileNotFound(String),

    /// ファイルのスキーマが宛先テーブルと互換性がない
    #[error("schema mismatch loading {table}: {message}")]
    SchemaMismatch { table: String, message: String },

    /// その他のロードジョブ拒否（クォータ超過、不正ファイル、権限不足など）
    #[error("load job failed for {table}: {message}")]
    LoadJobFailure { table: String, message: String },
}

impl LoadError {
    /// エラー種別名を返す（ログ用）
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Authentication(_) => "AuthenticationError",
            LoadError::InvalidProject(_) => "InvalidProjectError",
            LoadError::FileNotFound(_) => "FileNotFoundError",
            LoadError::SchemaMismatch { .. } => "SchemaMismatchError",
            LoadError::LoadJobFailure { .. } => "LoadJobFailure",
        }
    }
}
