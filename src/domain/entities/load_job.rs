//! # Load Job Value Objects
//!
//! ロードジョブ定義のバリューオブジェクト

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// ソースファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    #[default]
    Parquet,
    Avro,
    Orc,
    Csv,
    NewlineDelimitedJson,
}

impl SourceFormat {
    /// BigQuery API上の形式名を返す
    pub fn api_name(&self) -> &'static str {
        match self {
            SourceFormat::Parquet => "PARQUET",
            SourceFormat::Avro => "AVRO",
            SourceFormat::Orc => "ORC",
            SourceFormat::Csv => "CSV",
            SourceFormat::NewlineDelimitedJson => "NEWLINE_DELIMITED_JSON",
        }
    }

    /// ファイル内にスキーマを持つ列指向/自己記述形式かどうか
    pub fn is_self_describing(&self) -> bool {
        matches!(
            self,
            SourceFormat::Parquet | SourceFormat::Avro | SourceFormat::Orc
        )
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(SourceFormat::Parquet),
            "avro" => Ok(SourceFormat::Avro),
            "orc" => Ok(SourceFormat::Orc),
            "csv" => Ok(SourceFormat::Csv),
            "json" | "jsonl" | "newline_delimited_json" => Ok(SourceFormat::NewlineDelimitedJson),
            other => Err(format!("unsupported source format: {}", other)),
        }
    }
}

/// 宛先テーブル（`dataset.table`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl FromStr for TableRef {
    type Err = String;

    /// `dataset.table` 形式をパースする
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((dataset, table))
                if !dataset.is_empty() && !table.is_empty() && !table.contains('.') =>
            {
                Ok(TableRef::new(dataset, table))
            }
            _ => Err(format!(
                "destination table must be of the form dataset.table: {}",
                s
            )),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

/// ロードジョブ定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJobSpec {
    /// ソースファイルのパス
    pub source_path: PathBuf,
    /// 宛先テーブル
    pub destination: TableRef,
    /// ソースファイル形式
    pub format: SourceFormat,
}

impl LoadJobSpec {
    pub fn new(source_path: impl Into<PathBuf>, destination: TableRef, format: SourceFormat) -> Self {
        Self {
            source_path: source_path.into(),
            destination,
            format,
        }
    }
}

/// 完了したロードジョブの受領情報
///
/// ログ出力専用で、内容の検証には使わない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJobReceipt {
    pub job_id: String,
    pub destination: TableRef,
}
