//! dbt Metadata API Response Models
//!
//! GraphQLレスポンスのシリアライズ用構造体

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// GraphQLリクエストボディ
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

/// GraphQLレスポンス（`data` と `errors`）
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnvironmentData {
    pub environment: Option<Environment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub adapter_type: Option<String>,
    pub dbt_project_name: Option<String>,
    pub definition: Option<Definition>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub lineage: Vec<LineageNode>,
}

/// `environment.definition.lineage` の1要素
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageNode {
    pub access: Option<String>,
    pub alias: Option<String>,
    pub database: Option<String>,
    pub file_path: Option<String>,
    pub group: Option<String>,
    pub matches_method: Option<bool>,
    pub materialization_type: Option<String>,
    pub name: Option<String>,
    pub parent_ids: Option<Vec<String>>,
    /// 数値または数値文字列で返る
    pub project_id: Option<Value>,
    pub public_parent_ids: Option<Vec<String>>,
    pub resource_type: Option<String>,
    pub schema: Option<String>,
    pub tags: Option<Vec<String>>,
    pub unique_id: Option<String>,
    pub version: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColumnData {
    pub column: Option<ColumnQuery>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColumnQuery {
    #[serde(default)]
    pub lineage: Vec<ColumnLineageNode>,
}

/// `column.lineage` の1要素
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLineageNode {
    pub account_id: Option<Value>,
    pub child_columns: Option<Vec<String>>,
    pub depth: Option<i64>,
    pub description: Option<String>,
    pub description_origin_column_name: Option<String>,
    pub description_origin_resource_unique_id: Option<String>,
    pub environment_id: Option<Value>,
    pub error: Option<String>,
    pub error_category: Option<String>,
    pub is_error: Option<bool>,
    pub is_primary_key: Option<bool>,
    pub name: Option<String>,
    pub node_unique_id: Option<String>,
    pub parent_columns: Option<Vec<String>>,
    pub project_id: Option<Value>,
    pub relationship: Option<String>,
    pub run_id: Option<Value>,
    pub transformation_type: Option<String>,
    pub unique_id: Option<String>,
}

/// 数値または数値文字列を i64 にする
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// スカラー値を文字列にする（null は None）
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
