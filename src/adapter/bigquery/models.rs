//! BigQuery Job Resource Models
//!
//! jobs.insert / jobs.get のJSON表現

use serde::{Deserialize, Serialize};

use crate::domain::entities::load_job::{LoadJobSpec, SourceFormat};
use crate::domain::entities::project::ProjectContext;

pub const JOB_STATE_DONE: &str = "DONE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<JobConfiguration>,
    #[serde(skip_serializing)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<JobConfigurationLoad>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfigurationLoad {
    pub destination_table: TableReference,
    pub source_format: String,
    // writeDisposition は送らない（サービス既定の追記）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parquet_options: Option<ParquetOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParquetOptions {
    pub enable_list_inference: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub state: String,
    pub error_result: Option<ErrorProto>,
    pub errors: Option<Vec<ErrorProto>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub location: Option<String>,
}

/// Google API エラーレスポンス（`{"error": {...}}`）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

impl Job {
    /// ロードジョブのメタデータを作成
    pub fn load(context: &ProjectContext, spec: &LoadJobSpec, job_id: String) -> Self {
        let parquet_options = (spec.format == SourceFormat::Parquet).then_some(ParquetOptions {
            enable_list_inference: true,
        });

        Job {
            job_reference: Some(JobReference {
                project_id: context.project_id.to_string(),
                job_id,
                location: context.location.clone(),
            }),
            configuration: Some(JobConfiguration {
                load: Some(JobConfigurationLoad {
                    destination_table: TableReference {
                        project_id: context.project_id.to_string(),
                        dataset_id: spec.destination.dataset.clone(),
                        table_id: spec.destination.table.clone(),
                    },
                    source_format: spec.format.api_name().to_string(),
                    parquet_options,
                }),
            }),
            status: None,
        }
    }

    /// エラーメッセージ用の `dataset.table`
    pub fn destination_label(&self) -> String {
        self.configuration
            .as_ref()
            .and_then(|c| c.load.as_ref())
            .map(|load| {
                format!(
                    "{}.{}",
                    load.destination_table.dataset_id, load.destination_table.table_id
                )
            })
            .unwrap_or_else(|| self.job_id().unwrap_or_default().to_string())
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_reference.as_ref().map(|r| r.job_id.as_str())
    }

    pub fn is_done(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.state == JOB_STATE_DONE)
    }

    pub fn error_result(&self) -> Option<&ErrorProto> {
        self.status.as_ref().and_then(|s| s.error_result.as_ref())
    }
}
