//! Configuration
//!
//! 設定ファイル（任意）と環境変数から設定を解決する

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "./lineage-sync.json";
pub const DEFAULT_DATASET: &str = "dbt_lineage";
pub const DEFAULT_MODEL_LINEAGE_PATH: &str = "dbt_model_lineage.parquet";
pub const DEFAULT_COLUMN_LINEAGE_PATH: &str = "dbt_column_lineage.parquet";
pub const DEFAULT_DBT_METADATA_URL: &str = "https://metadata.cloud.getdbt.com/beta/graphql";

/// dbt Cloud Metadata API の設定
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DbtConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub environment_id: Option<String>,
}

impl Default for DbtConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DBT_METADATA_URL.to_string(),
            api_token: None,
            environment_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub project_id: String,
    pub dataset: String,
    pub location: Option<String>,

    // Authentication (ADC when both are unset)
    pub service_account_key_path: Option<String>,
    pub access_token: Option<String>,

    pub model_lineage_path: String,
    pub column_lineage_path: String,

    pub dbt: DbtConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: DEFAULT_DATASET.to_string(),
            location: None,
            service_account_key_path: None,
            access_token: None,
            model_lineage_path: DEFAULT_MODEL_LINEAGE_PATH.to_string(),
            column_lineage_path: DEFAULT_COLUMN_LINEAGE_PATH.to_string(),
            dbt: DbtConfig::default(),
        }
    }
}

impl Config {
    /// 設定ファイルと実行環境の環境変数から設定を読み込む
    ///
    /// `path` 省略時は `./lineage-sync.json` を探し、無ければ既定値から始める。
    /// 明示したパスが存在しない場合はエラー
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::resolve(path.map(Path::new), |key| std::env::var(key).ok())
    }

    /// 設定ファイルを読み、`env` で与えられた値で上書きする
    pub fn resolve<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::read_file(path)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::read_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(env);
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空文字の環境変数は未設定として扱う（GCP_PROJECT_ID を除く）
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // GCP_PROJECT_ID= のように空で渡された場合も上書きし、後段で InvalidProject にする
        if let Some(project_id) = env("GCP_PROJECT_ID") {
            self.project_id = project_id;
        }
        if let Some(dataset) = non_empty("BQ_DATASET") {
            self.dataset = dataset;
        }
        if let Some(location) = non_empty("BQ_LOCATION") {
            self.location = Some(location);
        }
        if let Some(key_path) = non_empty("GCP_SERVICE_ACCOUNT_KEY") {
            self.service_account_key_path = Some(key_path);
        }
        if let Some(token) = non_empty("GCP_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(token) = non_empty("DBT_METADATA_API_TOKEN") {
            self.dbt.api_token = Some(token);
        }
        if let Some(environment_id) = non_empty("DBT_METADATA_ENVIRONMENT_ID") {
            self.dbt.environment_id = Some(environment_id);
        }
        if let Some(url) = non_empty("DBT_METADATA_API_URL") {
            self.dbt.api_url = url;
        }
    }
}
