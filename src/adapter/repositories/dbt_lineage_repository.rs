//! dbt Lineage Repository Implementation
//!
//! LineageSourceのdbt Metadata API実装

use anyhow::Result;
use async_trait::async_trait;

use crate::adapter::dbt::client::DbtMetadataClient;
use crate::adapter::dbt::models::{value_as_i64, value_as_string, ColumnLineageNode, LineageNode};
use crate::domain::entities::lineage::{ColumnLineage, ModelLineage};
use crate::domain::repositories::lineage_repository::LineageSource;

/// dbt Metadata API からリネージを取得するリポジトリ
pub struct DbtLineageRepository {
    client: DbtMetadataClient,
}

impl DbtLineageRepository {
    pub fn new(client: DbtMetadataClient) -> Self {
        Self { client }
    }

    /// APIのノードをモデル行に変換
    pub fn to_model_lineage(node: LineageNode) -> ModelLineage {
        ModelLineage {
            project_id: node.project_id.as_ref().and_then(value_as_i64),
            database: node.database,
            schema: node.schema,
            name: node.name,
            node_id: node.unique_id,
            tags: node.tags,
            resource_type: node.resource_type,
            materialization: node.materialization_type,
            access: node.access,
            group: node.group,
            version: node.version.as_ref().and_then(value_as_string),
            parent_ids: node.parent_ids,
            public_parent_ids: node.public_parent_ids,
        }
    }

    /// APIのノードをカラム行に変換（カラム名は小文字）
    pub fn to_column_lineage(node: ColumnLineageNode) -> ColumnLineage {
        ColumnLineage {
            project_id: node.project_id.as_ref().and_then(value_as_i64),
            node_id: node.node_unique_id,
            column_node_id: node.unique_id,
            column_name: node.name.map(|name| name.to_lowercase()),
            description: node.description,
            is_primary_key: node.is_primary_key,
            transformation_type: node.transformation_type,
            description_origin_column_name: node.description_origin_column_name,
            description_origin_resource_unique_id: node.description_origin_resource_unique_id,
            relationship: node.relationship,
            parent_columns: node.parent_columns,
            child_columns: node.child_columns,
        }
    }
}

#[async_trait]
impl LineageSource for DbtLineageRepository {
    async fn fetch_model_lineage(&self) -> Result<Vec<ModelLineage>> {
        let nodes = self.client.query_model_lineage().await?;
        Ok(nodes.into_iter().map(Self::to_model_lineage).collect())
    }

    async fn fetch_column_lineage(&self, node_unique_id: &str) -> Result<Vec<ColumnLineage>> {
        let nodes = self.client.query_column_lineage(node_unique_id).await?;
        Ok(nodes.into_iter().map(Self::to_column_lineage).collect())
    }
}
