//! dbt Cloud Metadata API Client
//!
//! GraphQLでモデル/カラムのリネージを取得する

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::models::{
    ColumnData, ColumnLineageNode, EnvironmentData, GraphQlRequest, GraphQlResponse, LineageNode,
};
use crate::adapter::config::DbtConfig;

const MODEL_LINEAGE_QUERY: &str = r#"
query Environment($environmentId: BigInt!) {
    environment(id: $environmentId) {
        adapterType
        dbtProjectName
        definition {
            lineage(filter: { types: Model }) {
                access
                alias
                database
                filePath
                group
                matchesMethod
                materializationType
                name
                parentIds
                projectId
                publicParentIds
                resourceType
                schema
                tags
                uniqueId
                version
            }
        }
    }
}
"#;

const COLUMN_LINEAGE_QUERY: &str = r#"
query Column($environmentId: BigInt!, $nodeUniqueId: String!) {
    column(environmentId: $environmentId) {
        lineage(nodeUniqueId: $nodeUniqueId) {
            accountId
            childColumns
            depth
            description
            descriptionOriginColumnName
            descriptionOriginResourceUniqueId
            environmentId
            error
            errorCategory
            isError
            isPrimaryKey
            name
            nodeUniqueId
            parentColumns
            projectId
            relationship
            runId
            transformationType
            uniqueId
        }
    }
}
"#;

/// dbt Metadata API クライアント
pub struct DbtMetadataClient {
    http: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
    environment_id: Value,
}

impl DbtMetadataClient {
    /// 設定からクライアントを作成
    ///
    /// 環境IDが未設定の場合はエラー
    pub fn new(config: &DbtConfig) -> Result<Self> {
        let environment_id = config
            .environment_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .context("DBT_METADATA_ENVIRONMENT_ID is not set")?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            environment_id: environment_id_value(environment_id),
        })
    }

    /// 環境内のモデルリネージを取得する
    pub async fn query_model_lineage(&self) -> Result<Vec<LineageNode>> {
        let variables = json!({ "environmentId": self.environment_id });
        let data: Option<EnvironmentData> = self.execute(MODEL_LINEAGE_QUERY, variables).await?;

        let nodes = data
            .and_then(|d| d.environment)
            .and_then(|e| e.definition)
            .map(|d| d.lineage);

        match nodes {
            Some(nodes) => Ok(nodes),
            None => {
                warn!("No valid model lineage found in the response");
                Ok(Vec::new())
            }
        }
    }

    /// 指定モデルのカラムリネージを取得する
    pub async fn query_column_lineage(&self, node_unique_id: &str) -> Result<Vec<ColumnLineageNode>> {
        let variables = json!({
            "environmentId": self.environment_id,
            "nodeUniqueId": node_unique_id,
        });
        let data: Option<ColumnData> = self.execute(COLUMN_LINEAGE_QUERY, variables).await?;

        match data.and_then(|d| d.column).map(|c| c.lineage) {
            Some(nodes) => Ok(nodes),
            None => {
                warn!("No valid column lineage found for {}", node_unique_id);
                Ok(Vec::new())
            }
        }
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<Option<T>> {
        let mut request = self
            .http
            .post(&self.api_url)
            .json(&GraphQlRequest { query, variables });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send query to {}", self.api_url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Metadata API response")?;

        if status != reqwest::StatusCode::OK {
            bail!("Query failed with status code {}: {}", status.as_u16(), body);
        }

        let parsed: GraphQlResponse<T> =
            serde_json::from_str(&body).context("Failed to parse Metadata API response")?;
        for error in &parsed.errors {
            warn!("Metadata API returned an error: {}", error.message);
        }
        debug!("Metadata API response received ({} bytes)", body.len());

        Ok(parsed.data)
    }
}

/// 数値の環境IDはJSON数値として送る
fn environment_id_value(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}
