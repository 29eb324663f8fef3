//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **ProjectId / ProjectContext**: ロード先プロジェクト
//! - **LoadJobSpec**: ロードジョブ定義（ソース、宛先、形式）
//! - **ModelLineage / ColumnLineage**: dbtリネージ行

pub mod lineage;
pub mod load_job;
pub mod project;
