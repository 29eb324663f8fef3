//! GCP Authentication
//!
//! Google Cloud Platform認証機能
//!
//! 認証情報はプロバイダオブジェクトとして保持し、プロセス全体の環境変数は書き換えない

use async_trait::async_trait;
use google_cloud_auth::credentials::{self, service_account, CacheableResource, Credentials};
use http::Extensions;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio::sync::OnceCell;

#[cfg(test)]
use mockall::automock;

use crate::domain::error::LoadError;

/// Expands tilde in path and returns the full path
pub fn expand_key_path(key_path: &str) -> String {
    shellexpand::tilde(key_path).to_string()
}

/// 認証ヘッダーの供給元
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// リクエストに付与する認証ヘッダーを返す
    async fn authorization_headers(&self) -> Result<HeaderMap, LoadError>;
}

/// 発行済みのアクセストークンをそのまま使うプロバイダ
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn authorization_headers(&self) -> Result<HeaderMap, LoadError> {
        if self.token.trim().is_empty() {
            return Err(LoadError::Authentication(
                "access token is empty".to_string(),
            ));
        }
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token.trim()))
            .map_err(|e| LoadError::Authentication(format!("invalid access token: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

/// 認証情報の取得元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Application Default Credentials
    ApplicationDefault,
    /// サービスアカウントキーファイル
    ServiceAccountKey(String),
}

/// google-cloud-auth の Credentials を使うプロバイダ
///
/// Credentials は最初の呼び出し時に一度だけ作成される
pub struct GoogleCredentialsProvider {
    source: CredentialSource,
    credentials: OnceCell<Credentials>,
}

impl GoogleCredentialsProvider {
    pub fn new(source: CredentialSource) -> Self {
        Self {
            source,
            credentials: OnceCell::new(),
        }
    }

    #[cfg_attr(coverage_nightly, coverage(off))]
    fn build_credentials(&self) -> Result<Credentials, LoadError> {
        match &self.source {
            CredentialSource::ApplicationDefault => credentials::Builder::default()
                .build()
                .map_err(|e| {
                    LoadError::Authentication(format!(
                        "Failed to load application default credentials: {}",
                        e
                    ))
                }),
            CredentialSource::ServiceAccountKey(key_path) => {
                let expanded_path = expand_key_path(key_path);
                let content = std::fs::read_to_string(&expanded_path).map_err(|e| {
                    LoadError::Authentication(format!(
                        "Failed to read service account key {}: {}",
                        expanded_path, e
                    ))
                })?;
                let key: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
                    LoadError::Authentication(format!(
                        "Failed to parse service account key {}: {}",
                        expanded_path, e
                    ))
                })?;
                service_account::Builder::new(key).build().map_err(|e| {
                    LoadError::Authentication(format!(
                        "Failed to authenticate with service account: {}",
                        e
                    ))
                })
            }
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[async_trait]
impl AccessTokenProvider for GoogleCredentialsProvider {
    async fn authorization_headers(&self) -> Result<HeaderMap, LoadError> {
        let credentials = self
            .credentials
            .get_or_try_init(|| async { self.build_credentials() })
            .await?;

        match credentials.headers(Extensions::new()).await {
            Ok(CacheableResource::New { data, .. }) => Ok(data),
            Ok(CacheableResource::NotModified) => Err(LoadError::Authentication(
                "credentials returned no authorization headers".to_string(),
            )),
            Err(e) => Err(LoadError::Authentication(e.to_string())),
        }
    }
}
