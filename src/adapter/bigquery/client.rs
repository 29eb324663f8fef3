//! BigQuery Client Abstractions
//!
//! ジョブAPIの抽象化とREST実装

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::RequestBuilder;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use super::errors::{classify_http_failure, classify_transport_failure, RequestPhase};
use super::models::{Job, JobReference};
use crate::adapter::auth::AccessTokenProvider;
use crate::domain::entities::project::{ProjectContext, ProjectId};
use crate::domain::error::LoadError;

pub const BIGQUERY_API_ROOT: &str = "https://bigquery.googleapis.com";
/// クォータプロジェクトを指定するヘッダー
pub const QUOTA_PROJECT_HEADER: &str = "x-goog-user-project";

/// Trait for BigQuery job operations
/// This enables mocking in tests while using the REST API in production
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BigQueryJobApi: Send + Sync {
    /// プロジェクトにアクセスできるか確認する
    async fn check_project(&self, project_id: &ProjectId) -> Result<(), LoadError>;

    /// メディアアップロード付きでロードジョブを作成する
    async fn insert_load_job(
        &self,
        context: &ProjectContext,
        job: &Job,
        media: Vec<u8>,
    ) -> Result<Job, LoadError>;

    /// ジョブの最新状態を取得する
    async fn get_job(&self, context: &ProjectContext, reference: &JobReference)
        -> Result<Job, LoadError>;
}

/// BigQuery REST API client
pub struct RestBigQueryClient {
    http: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl RestBigQueryClient {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_base_url(tokens, BIGQUERY_API_ROOT)
    }

    /// 接続先を差し替える（テスト、エミュレータ用）
    pub fn with_base_url(tokens: Arc<dyn AccessTokenProvider>, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 認証ヘッダーとクォータプロジェクトヘッダーを付与する
    async fn authorize(
        &self,
        request: RequestBuilder,
        quota_project: &ProjectId,
    ) -> Result<RequestBuilder, LoadError> {
        let headers = self.tokens.authorization_headers().await?;
        let quota = HeaderValue::from_str(quota_project.as_str()).map_err(|e| {
            LoadError::InvalidProject(format!("{}: {}", quota_project, e))
        })?;
        Ok(request.headers(headers).header(QUOTA_PROJECT_HEADER, quota))
    }

    /// リクエストを送信し、成功時はボディを返す
    async fn send(
        &self,
        request: RequestBuilder,
        phase: RequestPhase,
        target: &str,
    ) -> Result<String, LoadError> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_failure(phase, target, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_failure(phase, target, &e))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_http_failure(phase, target, status.as_u16(), &body))
        }
    }

    fn parse_job(body: &str, target: &str) -> Result<Job, LoadError> {
        serde_json::from_str(body).map_err(|e| LoadError::LoadJobFailure {
            table: target.to_string(),
            message: format!("Failed to parse job response: {}", e),
        })
    }
}

#[async_trait]
impl BigQueryJobApi for RestBigQueryClient {
    async fn check_project(&self, project_id: &ProjectId) -> Result<(), LoadError> {
        let url = format!(
            "{}/bigquery/v2/projects/{}/datasets",
            self.base_url, project_id
        );
        let request = self.http.get(url).query(&[("maxResults", "1")]);
        let request = self.authorize(request, project_id).await?;

        self.send(request, RequestPhase::ConfigureContext, project_id.as_str())
            .await
            .map(|_| ())
    }

    async fn insert_load_job(
        &self,
        context: &ProjectContext,
        job: &Job,
        media: Vec<u8>,
    ) -> Result<Job, LoadError> {
        let target = job.destination_label();
        let metadata = serde_json::to_vec(job).map_err(|e| LoadError::LoadJobFailure {
            table: target.clone(),
            message: format!("Failed to serialize job metadata: {}", e),
        })?;

        let boundary = format!("lineage_sync_{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata, &media);

        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs",
            self.base_url, context.project_id
        );
        let request = self
            .http
            .post(url)
            .query(&[("uploadType", "multipart")])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);
        let request = self.authorize(request, &context.quota_project_id).await?;

        let body = self.send(request, RequestPhase::Load, &target).await?;
        Self::parse_job(&body, &target)
    }

    async fn get_job(
        &self,
        context: &ProjectContext,
        reference: &JobReference,
    ) -> Result<Job, LoadError> {
        let url = format!(
            "{}/bigquery/v2/projects/{}/jobs/{}",
            self.base_url, reference.project_id, reference.job_id
        );
        let mut request = self.http.get(url);
        if let Some(location) = &reference.location {
            request = request.query(&[("location", location.as_str())]);
        }
        let request = self.authorize(request, &context.quota_project_id).await?;

        let body = self
            .send(request, RequestPhase::Load, &reference.job_id)
            .await?;
        Self::parse_job(&body, &reference.job_id)
    }
}

/// `multipart/related` のボディを組み立てる（メタデータ → メディアの順）
pub fn multipart_related_body(boundary: &str, metadata: &[u8], media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
