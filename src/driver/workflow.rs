//! Workflow Orchestration
//!
//! ワークフローのオーケストレーション

use anyhow::{bail, Result};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapter::auth::{
    AccessTokenProvider, CredentialSource, GoogleCredentialsProvider, StaticTokenProvider,
};
use crate::adapter::bigquery::client::RestBigQueryClient;
use crate::adapter::config::Config;
use crate::adapter::dbt::client::DbtMetadataClient;
use crate::adapter::repositories::bigquery_warehouse_repository::BigQueryWarehouseRepository;
use crate::adapter::repositories::dbt_lineage_repository::DbtLineageRepository;
use crate::adapter::repositories::parquet_lineage_repository::ParquetLineageRepository;
use crate::application::dto::load_plan::LoadPlan;
use crate::application::use_cases::configure_context::ConfigureContextUseCase;
use crate::application::use_cases::extract_lineage::{
    ExtractLineageUseCase, ExtractSummary, ExtractTargets,
};
use crate::application::use_cases::load_tables::LoadTablesUseCase;
use crate::domain::entities::project::ProjectId;
use crate::domain::error::LoadError;
use crate::domain::repositories::lineage_repository::{LineageSource, LineageWriter};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

use super::cli::{Args, Command};

/// 設定から認証ヘッダーの供給元を選ぶ
///
/// アクセストークン > サービスアカウントキー > ADC の順
pub fn token_provider(config: &Config) -> Arc<dyn AccessTokenProvider> {
    if let Some(token) = &config.access_token {
        return Arc::new(StaticTokenProvider::new(token.clone()));
    }
    match &config.service_account_key_path {
        Some(key_path) => Arc::new(GoogleCredentialsProvider::new(
            CredentialSource::ServiceAccountKey(key_path.clone()),
        )),
        None => Arc::new(GoogleCredentialsProvider::new(
            CredentialSource::ApplicationDefault,
        )),
    }
}

/// Lineage Sync Workflow
pub struct LineageWorkflow {
    config: Config,
    warehouse: Arc<dyn WarehouseRepository>,
    lineage_source: Option<Arc<dyn LineageSource>>,
    lineage_writer: Arc<dyn LineageWriter>,
}

impl LineageWorkflow {
    /// Create a new workflow instance with dependency injection
    pub fn new(config: Config) -> Self {
        let api = Arc::new(RestBigQueryClient::new(token_provider(&config)));
        let warehouse = Arc::new(BigQueryWarehouseRepository::new(
            api,
            config.location.clone(),
        ));

        Self {
            config,
            warehouse,
            lineage_source: None,
            lineage_writer: Arc::new(ParquetLineageRepository::new()),
        }
    }

    /// リポジトリを差し替えてワークフローを作成
    ///
    /// `lineage_source` が None の場合は設定から dbt Metadata API クライアントを作る
    pub fn with_repositories(
        config: Config,
        warehouse: Arc<dyn WarehouseRepository>,
        lineage_source: Option<Arc<dyn LineageSource>>,
        lineage_writer: Arc<dyn LineageWriter>,
    ) -> Self {
        Self {
            config,
            warehouse,
            lineage_source,
            lineage_writer,
        }
    }

    /// 設定されたファイルパスでの2テーブルのロード計画
    pub fn load_plan(&self) -> LoadPlan {
        LoadPlan::lineage(
            &self.config.dataset,
            &self.config.model_lineage_path,
            &self.config.column_lineage_path,
        )
    }

    fn extract_targets(&self) -> ExtractTargets {
        ExtractTargets {
            model_lineage_path: PathBuf::from(&self.config.model_lineage_path),
            column_lineage_path: PathBuf::from(&self.config.column_lineage_path),
        }
    }

    fn lineage_source(&self) -> Result<Arc<dyn LineageSource>> {
        match &self.lineage_source {
            Some(source) => Ok(source.clone()),
            None => {
                let client = DbtMetadataClient::new(&self.config.dbt)?;
                Ok(Arc::new(DbtLineageRepository::new(client)))
            }
        }
    }

    fn require_environment_id(&self) -> Result<&str> {
        match self.config.dbt.environment_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => bail!("DBT_METADATA_ENVIRONMENT_ID is not set"),
        }
    }

    /// Execute the selected command
    pub async fn execute(&self, args: Args) -> Result<()> {
        let command = args.command();
        info!("Starting lineage-sync ({:?})...", command);
        info!("Dry run: {}", args.dry_run);

        println!("✓ Using configuration:");
        println!("  Project: {}", self.config.project_id);
        println!("  Dataset: {}", self.config.dataset);
        if let Some(location) = &self.config.location {
            println!("  Location: {}", location);
        }

        match command {
            Command::Load => self.run_load(self.load_plan(), args.dry_run).await?,
            Command::Extract => {
                self.run_extract(args.dry_run).await?;
            }
            Command::Sync => self.run_sync(args.dry_run).await?,
        }

        println!("✓ Done!");
        Ok(())
    }

    /// コンテキストを設定し、計画のテーブルを順にロードする
    async fn run_load(&self, plan: LoadPlan, dry_run: bool) -> Result<()> {
        if dry_run {
            let project_id = ProjectId::parse(&self.config.project_id)?;
            if let Some(missing) = plan.missing_sources().first() {
                return Err(LoadError::FileNotFound(missing.display().to_string()).into());
            }

            println!("✓ Dry-run mode (not contacting BigQuery)");
            println!("  Would load into project {}:", project_id);
            for job in &plan.jobs {
                println!(
                    "    - {} -> {} ({})",
                    job.source_path.display(),
                    job.destination,
                    job.format.api_name()
                );
            }
            return Ok(());
        }

        let context = ConfigureContextUseCase::new(self.warehouse.clone())
            .execute(&self.config.project_id)
            .await?;
        println!("✓ Configured project context: {}", context.project_id);

        let summary = LoadTablesUseCase::new(self.warehouse.clone())
            .execute(&context, &plan)
            .await?;
        for receipt in &summary.receipts {
            println!("✓ Loaded {} (job {})", receipt.destination, receipt.job_id);
        }

        Ok(())
    }

    /// dbt Metadata API からリネージを取得して書き出す
    async fn run_extract(&self, dry_run: bool) -> Result<ExtractSummary> {
        let targets = self.extract_targets();

        if dry_run {
            let environment_id = self.require_environment_id()?;
            println!("✓ Dry-run mode (not contacting the dbt Metadata API)");
            println!("  Environment: {}", environment_id);
            println!("  API: {}", self.config.dbt.api_url);
            println!("  Would write:");
            println!("    - {}", targets.model_lineage_path.display());
            println!("    - {}", targets.column_lineage_path.display());
            return Ok(ExtractSummary::default());
        }

        let use_case = ExtractLineageUseCase::new(self.lineage_source()?, self.lineage_writer.clone());
        let summary = use_case.execute(&targets).await?;

        if summary.model_rows == 0 {
            println!("⚠ No models found in the environment");
        } else {
            println!(
                "✓ Model lineage saved to {} ({} rows)",
                targets.model_lineage_path.display(),
                summary.model_rows
            );
        }
        if summary.column_rows > 0 {
            println!(
                "✓ Column lineage saved to {} ({} rows)",
                targets.column_lineage_path.display(),
                summary.column_rows
            );
        } else if summary.model_rows > 0 {
            println!("⚠ No column lineage data found");
        }
        if !summary.failed_models.is_empty() {
            println!(
                "⚠ Column lineage skipped for {} model(s)",
                summary.failed_models.len()
            );
        }

        Ok(summary)
    }

    /// 抽出してから今回書き出したファイルだけをロードする
    async fn run_sync(&self, dry_run: bool) -> Result<()> {
        if dry_run {
            ProjectId::parse(&self.config.project_id)?;
            self.run_extract(true).await?;
            println!("  Would then load the written files into:");
            for job in &self.load_plan().jobs {
                println!("    - {}", job.destination);
            }
            return Ok(());
        }

        let summary = self.run_extract(false).await?;
        if summary.written_files.is_empty() {
            bail!("No lineage files were written; nothing to load");
        }

        let plan = self.load_plan().retain_sources(&summary.written_files);
        self.run_load(plan, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::lineage::{ColumnLineage, ModelLineage};
    use crate::domain::entities::load_job::LoadJobReceipt;
    use crate::domain::entities::project::ProjectContext;
    use crate::domain::repositories::lineage_repository::{MockLineageSource, MockLineageWriter};
    use crate::domain::repositories::warehouse_repository::MockWarehouseRepository;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            project_id: "test-project".to_string(),
            dataset: "lineage".to_string(),
            model_lineage_path: dir
                .path()
                .join("dbt_model_lineage.parquet")
                .to_string_lossy()
                .to_string(),
            column_lineage_path: dir
                .path()
                .join("dbt_column_lineage.parquet")
                .to_string_lossy()
                .to_string(),
            ..Config::default()
        }
    }

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("lineage-sync").chain(argv.iter().copied()))
    }

    fn workflow(
        config: Config,
        warehouse: MockWarehouseRepository,
        source: Option<MockLineageSource>,
        writer: MockLineageWriter,
    ) -> LineageWorkflow {
        LineageWorkflow::with_repositories(
            config,
            Arc::new(warehouse),
            source.map(|s| Arc::new(s) as Arc<dyn LineageSource>),
            Arc::new(writer),
        )
    }

    fn receipt_for(job: &crate::domain::entities::load_job::LoadJobSpec) -> LoadJobReceipt {
        LoadJobReceipt {
            job_id: format!("job_{}", job.destination.table),
            destination: job.destination.clone(),
        }
    }

    #[tokio::test]
    async fn test_token_provider_prefers_access_token() {
        // キーファイルは存在しないが、アクセストークンがあれば読まれない
        let config = Config {
            access_token: Some("ya29.token".to_string()),
            service_account_key_path: Some("/nonexistent/lineage-sync-key.json".to_string()),
            ..Config::default()
        };

        let headers = token_provider(&config)
            .authorization_headers()
            .await
            .unwrap();

        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer ya29.token"
        );
    }

    #[tokio::test]
    async fn test_token_provider_uses_service_account_key() {
        let config = Config {
            service_account_key_path: Some("/nonexistent/lineage-sync-key.json".to_string()),
            ..Config::default()
        };

        let result = token_provider(&config).authorization_headers().await;

        match result {
            Err(LoadError::Authentication(message)) => {
                assert!(message.contains("/nonexistent/lineage-sync-key.json"));
            }
            other => panic!("expected Authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_success() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut warehouse = MockWarehouseRepository::new();
        warehouse
            .expect_configure_context()
            .times(1)
            .returning(|id| Ok(ProjectContext::for_project(id.clone(), None)));
        warehouse
            .expect_load_table()
            .times(2)
            .returning(|_, job| Ok(receipt_for(job)));

        let wf = workflow(config, warehouse, None, MockLineageWriter::new());

        assert!(wf.execute(args(&[])).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_empty_project_fails_before_service() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.project_id = String::new();

        let mut warehouse = MockWarehouseRepository::new();
        warehouse.expect_configure_context().never();
        warehouse.expect_load_table().never();

        let wf = workflow(config, warehouse, None, MockLineageWriter::new());
        let err = wf.execute(args(&["load"])).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::InvalidProject(_))
        ));
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut warehouse = MockWarehouseRepository::new();
        warehouse
            .expect_configure_context()
            .returning(|id| Ok(ProjectContext::for_project(id.clone(), None)));
        warehouse
            .expect_load_table()
            .times(1)
            .returning(|_, job| Err(LoadError::FileNotFound(job.source_path.display().to_string())));

        let wf = workflow(config, warehouse, None, MockLineageWriter::new());
        let err = wf.execute(args(&[])).await.unwrap_err();

        assert_eq!(err.downcast_ref::<LoadError>().map(|e| e.kind()), Some("FileNotFoundError"));
    }

    #[tokio::test]
    async fn test_dry_run_load_checks_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut warehouse = MockWarehouseRepository::new();
        warehouse.expect_configure_context().never();
        warehouse.expect_load_table().never();
        let wf = workflow(config.clone(), warehouse, None, MockLineageWriter::new());

        let err = wf.execute(args(&["--dry-run"])).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::FileNotFound(_))
        ));

        fs::write(&config.model_lineage_path, b"PAR1").unwrap();
        fs::write(&config.column_lineage_path, b"PAR1").unwrap();
        assert!(wf.execute(args(&["--dry-run"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_extract_writes_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut source = MockLineageSource::new();
        source.expect_fetch_model_lineage().returning(|| {
            Ok(vec![ModelLineage {
                node_id: Some("model.pkg.orders".to_string()),
                ..Default::default()
            }])
        });
        source
            .expect_fetch_column_lineage()
            .returning(|_| Ok(vec![ColumnLineage::default()]));

        let mut writer = MockLineageWriter::new();
        writer
            .expect_write_model_lineage()
            .times(1)
            .returning(|_, rows| Ok(rows.len()));
        writer
            .expect_write_column_lineage()
            .times(1)
            .returning(|_, rows| Ok(rows.len()));

        let mut warehouse = MockWarehouseRepository::new();
        warehouse.expect_configure_context().never();

        let wf = workflow(config, warehouse, Some(source), writer);

        assert!(wf.execute(args(&["extract"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_extract_without_environment_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let wf = workflow(
            config,
            MockWarehouseRepository::new(),
            None,
            MockLineageWriter::new(),
        );

        let err = wf.execute(args(&["extract"])).await.unwrap_err();
        assert!(err.to_string().contains("DBT_METADATA_ENVIRONMENT_ID"));

        let err = wf.execute(args(&["extract", "--dry-run"])).await.unwrap_err();
        assert!(err.to_string().contains("DBT_METADATA_ENVIRONMENT_ID"));
    }

    #[tokio::test]
    async fn test_sync_loads_only_written_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut source = MockLineageSource::new();
        source.expect_fetch_model_lineage().returning(|| {
            Ok(vec![ModelLineage {
                node_id: Some("model.pkg.orders".to_string()),
                ..Default::default()
            }])
        });
        source
            .expect_fetch_column_lineage()
            .returning(|_| Ok(Vec::new()));

        let mut writer = MockLineageWriter::new();
        writer
            .expect_write_model_lineage()
            .returning(|_, rows| Ok(rows.len()));
        writer.expect_write_column_lineage().never();

        let mut warehouse = MockWarehouseRepository::new();
        warehouse
            .expect_configure_context()
            .times(1)
            .returning(|id| Ok(ProjectContext::for_project(id.clone(), None)));
        warehouse
            .expect_load_table()
            .withf(|_, job| job.destination.table == "dbt_model_lineage")
            .times(1)
            .returning(|_, job| Ok(receipt_for(job)));

        let wf = workflow(config, warehouse, Some(source), writer);

        assert!(wf.execute(args(&["sync"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_sync_with_nothing_written_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut source = MockLineageSource::new();
        source
            .expect_fetch_model_lineage()
            .returning(|| Ok(Vec::new()));

        let mut warehouse = MockWarehouseRepository::new();
        warehouse.expect_configure_context().never();
        warehouse.expect_load_table().never();

        let wf = workflow(config, warehouse, Some(source), MockLineageWriter::new());
        let err = wf.execute(args(&["sync"])).await.unwrap_err();

        assert!(err.to_string().contains("nothing to load"));
    }
}
