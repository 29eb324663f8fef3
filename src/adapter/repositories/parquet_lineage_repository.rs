//! Parquet Lineage Repository Implementation
//!
//! LineageWriterのParquet実装（Snappy圧縮）

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Int64Array, ListBuilder, StringArray, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::entities::lineage::{ColumnLineage, ModelLineage};
use crate::domain::repositories::lineage_repository::LineageWriter;
use crate::domain::services::lineage_flattening::{LineageFlattening, PARENT_SLOTS};

/// Parquetファイルに書き出すリポジトリ
#[derive(Debug, Default)]
pub struct ParquetLineageRepository;

impl ParquetLineageRepository {
    pub fn new() -> Self {
        Self
    }
}

fn utf8(name: &str) -> Field {
    Field::new(name, DataType::Utf8, true)
}

fn utf8_list(name: &str) -> Field {
    Field::new(
        name,
        DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
        true,
    )
}

fn string_column<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(StringArray::from_iter(values))
}

fn list_column<'a>(values: impl Iterator<Item = Option<&'a [String]>>) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for value in values {
        match value {
            Some(items) => {
                for item in items {
                    builder.values().append_value(item);
                }
                builder.append(true);
            }
            None => builder.append(false),
        }
    }
    Arc::new(builder.finish())
}

/// 固定長スロットの列（`{prefix}_1` 〜 `{prefix}_10`）を追加する
fn push_slot_columns(
    prefix: &str,
    slots: &[[Option<String>; PARENT_SLOTS]],
    fields: &mut Vec<Field>,
    columns: &mut Vec<ArrayRef>,
) {
    for i in 0..PARENT_SLOTS {
        fields.push(utf8(&format!("{}_{}", prefix, i + 1)));
        columns.push(string_column(slots.iter().map(|s| s[i].as_deref())));
    }
}

/// モデルリネージ行を RecordBatch にする
pub fn model_lineage_batch(rows: &[ModelLineage]) -> Result<RecordBatch> {
    let mut fields = vec![
        Field::new("project_id", DataType::Int64, true),
        utf8("database"),
        utf8("schema"),
        utf8("name"),
        utf8("node_id"),
        utf8_list("tags"),
        utf8("resource_type"),
        utf8("materialization"),
        utf8("access"),
        utf8("group"),
        utf8("version"),
        utf8_list("parent_ids"),
        utf8_list("public_parent_ids"),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.project_id).collect::<Vec<_>>(),
        )),
        string_column(rows.iter().map(|r| r.database.as_deref())),
        string_column(rows.iter().map(|r| r.schema.as_deref())),
        string_column(rows.iter().map(|r| r.name.as_deref())),
        string_column(rows.iter().map(|r| r.node_id.as_deref())),
        list_column(rows.iter().map(|r| r.tags.as_deref())),
        string_column(rows.iter().map(|r| r.resource_type.as_deref())),
        string_column(rows.iter().map(|r| r.materialization.as_deref())),
        string_column(rows.iter().map(|r| r.access.as_deref())),
        string_column(rows.iter().map(|r| r.group.as_deref())),
        string_column(rows.iter().map(|r| r.version.as_deref())),
        list_column(rows.iter().map(|r| r.parent_ids.as_deref())),
        list_column(rows.iter().map(|r| r.public_parent_ids.as_deref())),
    ];

    let slots: Vec<_> = rows.iter().map(LineageFlattening::model_parent_slots).collect();
    push_slot_columns("parent", &slots, &mut fields, &mut columns);

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("Failed to build model lineage batch")
}

/// カラムリネージ行を RecordBatch にする
pub fn column_lineage_batch(rows: &[ColumnLineage]) -> Result<RecordBatch> {
    let mut fields = vec![
        Field::new("project_id", DataType::Int64, true),
        utf8("node_id"),
        utf8("column_node_id"),
        utf8("column_name"),
        utf8("description"),
        Field::new("is_primary_key", DataType::Boolean, true),
        utf8("transformation_type"),
        utf8("description_origin_column_name"),
        utf8("description_origin_resource_unique_id"),
        utf8("relationship"),
        utf8_list("parent_columns"),
        utf8_list("child_columns"),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.project_id).collect::<Vec<_>>(),
        )),
        string_column(rows.iter().map(|r| r.node_id.as_deref())),
        string_column(rows.iter().map(|r| r.column_node_id.as_deref())),
        string_column(rows.iter().map(|r| r.column_name.as_deref())),
        string_column(rows.iter().map(|r| r.description.as_deref())),
        Arc::new(BooleanArray::from(
            rows.iter().map(|r| r.is_primary_key).collect::<Vec<_>>(),
        )),
        string_column(rows.iter().map(|r| r.transformation_type.as_deref())),
        string_column(rows.iter().map(|r| r.description_origin_column_name.as_deref())),
        string_column(
            rows.iter()
                .map(|r| r.description_origin_resource_unique_id.as_deref()),
        ),
        string_column(rows.iter().map(|r| r.relationship.as_deref())),
        list_column(rows.iter().map(|r| r.parent_columns.as_deref())),
        list_column(rows.iter().map(|r| r.child_columns.as_deref())),
    ];

    let slots: Vec<_> = rows.iter().map(LineageFlattening::column_parent_slots).collect();
    push_slot_columns("parent_column", &slots, &mut fields, &mut columns);

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("Failed to build column lineage batch")
}

/// RecordBatch を Snappy 圧縮の Parquet として書き出す
fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("Failed to create Parquet writer")?;
    writer
        .write(batch)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;
    Ok(())
}

async fn write_batch(path: &Path, batch: RecordBatch) -> Result<usize> {
    let rows = batch.num_rows();
    let target: PathBuf = path.to_path_buf();

    // エンコードはブロッキングなので専用スレッドで行う
    tokio::task::spawn_blocking(move || write_parquet(&target, &batch))
        .await
        .context("Parquet writer task panicked")??;

    info!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}

#[async_trait]
impl LineageWriter for ParquetLineageRepository {
    async fn write_model_lineage(&self, path: &Path, rows: &[ModelLineage]) -> Result<usize> {
        write_batch(path, model_lineage_batch(rows)?).await
    }

    async fn write_column_lineage(&self, path: &Path, rows: &[ColumnLineage]) -> Result<usize> {
        write_batch(path, column_lineage_batch(rows)?).await
    }
}
