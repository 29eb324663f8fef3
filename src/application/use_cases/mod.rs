//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **ConfigureContextUseCase**: プロジェクトコンテキストの設定
//! - **LoadTablesUseCase**: テーブルへのロード
//! - **ExtractLineageUseCase**: dbtリネージの抽出

pub mod configure_context;
pub mod extract_lineage;
pub mod load_tables;
