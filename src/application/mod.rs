//! # Application Layer
//!
//! アプリケーション固有のビジネスフロー（ユースケース）
//!
//! - Domain層のRepository traitだけに依存し、BigQueryやdbt APIの詳細は知らない
//! - **dto**: ロード計画
//! - **use_cases**: コンテキスト設定、テーブルロード、リネージ抽出

pub mod dto;
pub mod use_cases;
