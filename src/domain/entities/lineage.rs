//! # Lineage Entities
//!
//! dbtモデル/カラムのリネージ行

/// モデルリネージ（1モデル = 1行）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelLineage {
    pub project_id: Option<i64>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub name: Option<String>,
    /// dbtの uniqueId（例: `model.jaffle_shop.orders`）
    pub node_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub resource_type: Option<String>,
    pub materialization: Option<String>,
    pub access: Option<String>,
    pub group: Option<String>,
    pub version: Option<String>,
    pub parent_ids: Option<Vec<String>>,
    pub public_parent_ids: Option<Vec<String>>,
}

/// カラムリネージ（1カラム = 1行）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLineage {
    pub project_id: Option<i64>,
    pub node_id: Option<String>,
    pub column_node_id: Option<String>,
    /// 小文字化済みのカラム名
    pub column_name: Option<String>,
    pub description: Option<String>,
    pub is_primary_key: Option<bool>,
    pub transformation_type: Option<String>,
    pub description_origin_column_name: Option<String>,
    pub description_origin_resource_unique_id: Option<String>,
    pub relationship: Option<String>,
    pub parent_columns: Option<Vec<String>>,
    pub child_columns: Option<Vec<String>>,
}

impl ModelLineage {
    /// 空でない node_id を持つ場合に返す
    pub fn queryable_node_id(&self) -> Option<&str> {
        self.node_id.as_deref().filter(|id| !id.is_empty())
    }
}
