//! BigQuery Load Job Execution
//!
//! ソースファイルのアップロードとジョブ完了待ち

use log::{debug, info};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

use super::client::BigQueryJobApi;
use super::errors::classify_job_error;
use super::models::{Job, JobReference};
use crate::domain::entities::load_job::{LoadJobReceipt, LoadJobSpec, TableRef};
use crate::domain::entities::project::ProjectContext;
use crate::domain::error::LoadError;

pub const JOB_POLL_INTERVAL_MS: u64 = 1000;

/// ジョブIDを生成する（英数字、`_`、`-` のみ）
pub fn new_job_id(destination: &TableRef) -> String {
    let table: String = destination
        .table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("lineage_sync_{}_{}", table, uuid::Uuid::new_v4().simple())
}

/// ソースファイルを読み込む
///
/// 存在しないパスやディレクトリは `FileNotFound`。
/// ファイル全体をメモリに載せて 1 回の multipart リクエストで送るため、
/// 系譜テーブル程度のサイズが前提。数百 MB を超える入力には resumable upload が必要になる
pub async fn read_source(path: &Path, destination: &TableRef) -> Result<Vec<u8>, LoadError> {
    let not_found = || LoadError::FileNotFound(path.display().to_string());

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
        Err(e) => {
            return Err(LoadError::LoadJobFailure {
                table: destination.to_string(),
                message: format!("Failed to stat {}: {}", path.display(), e),
            })
        }
    };
    if !metadata.is_file() {
        return Err(not_found());
    }

    tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::LoadJobFailure {
            table: destination.to_string(),
            message: format!("Failed to read {}: {}", path.display(), e),
        })
}

/// ロードジョブを実行し、完了まで待つ
///
/// 完了判定は `bq load` の同期モードと同じく状態が DONE になるまで待つだけで、
/// 行数の検証などは行わない
pub async fn run_load_job<A: BigQueryJobApi + ?Sized>(
    api: &A,
    context: &ProjectContext,
    spec: &LoadJobSpec,
    poll_interval: Duration,
) -> Result<LoadJobReceipt, LoadError> {
    let media = read_source(&spec.source_path, &spec.destination).await?;
    let job_id = new_job_id(&spec.destination);
    let metadata = Job::load(context, spec, job_id.clone());

    info!(
        "Submitting load job {} ({} bytes) for {}",
        job_id,
        media.len(),
        spec.destination
    );
    let mut job = api.insert_load_job(context, &metadata, media).await?;

    let reference = job.job_reference.clone().unwrap_or(JobReference {
        project_id: context.project_id.to_string(),
        job_id: job_id.clone(),
        location: context.location.clone(),
    });

    while !job.is_done() {
        debug!("Load job {} not finished yet, polling", reference.job_id);
        sleep(poll_interval).await;
        job = api.get_job(context, &reference).await?;
    }

    if let Some(error_result) = job.error_result() {
        let errors = job
            .status
            .as_ref()
            .and_then(|s| s.errors.as_deref())
            .unwrap_or_default();
        return Err(classify_job_error(
            &spec.destination.to_string(),
            error_result,
            errors,
        ));
    }

    Ok(LoadJobReceipt {
        job_id: reference.job_id,
        destination: spec.destination.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::client::MockBigQueryJobApi;
    use super::super::models::{ErrorProto, JobStatus};
    use super::*;
    use crate::domain::entities::load_job::SourceFormat;
    use crate::domain::entities::project::ProjectId;
    use mockall::Sequence;
    use tempfile::TempDir;

    const NO_WAIT: Duration = Duration::from_millis(0);

    fn context() -> ProjectContext {
        ProjectContext::for_project(ProjectId::parse("my-project").unwrap(), None)
    }

    fn spec_for(path: &Path) -> LoadJobSpec {
        LoadJobSpec::new(
            path,
            TableRef::new("lineage", "dbt_model_lineage"),
            SourceFormat::Parquet,
        )
    }

    fn job_with_state(job_id: &str, state: &str, error: Option<ErrorProto>) -> Job {
        Job {
            job_reference: Some(JobReference {
                project_id: "my-project".to_string(),
                job_id: job_id.to_string(),
                location: Some("US".to_string()),
            }),
            configuration: None,
            status: Some(JobStatus {
                state: state.to_string(),
                errors: error.clone().map(|e| vec![e]),
                error_result: error,
            }),
        }
    }

    fn parquet_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("dbt_model_lineage.parquet");
        std::fs::write(&path, b"PAR1fakePAR1").unwrap();
        path
    }

    #[test]
    fn test_new_job_id_is_valid() {
        let id = new_job_id(&TableRef::new("ds", "dbt$model"));
        assert!(id.starts_with("lineage_sync_dbt_model_"));
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn test_new_job_id_is_unique() {
        let table = TableRef::new("ds", "t");
        assert_ne!(new_job_id(&table), new_job_id(&table));
    }

    #[tokio::test]
    async fn test_missing_file_never_contacts_service() {
        let mut api = MockBigQueryJobApi::new();
        api.expect_insert_load_job().never();
        api.expect_get_job().never();

        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("dbt_model_lineage.parquet");

        let result = run_load_job(&api, &context(), &spec_for(&missing), NO_WAIT).await;

        assert_eq!(
            result.unwrap_err(),
            LoadError::FileNotFound(missing.display().to_string())
        );
    }

    #[tokio::test]
    async fn test_directory_source_is_file_not_found() {
        let mut api = MockBigQueryJobApi::new();
        api.expect_insert_load_job().never();

        let temp_dir = TempDir::new().unwrap();
        let result = run_load_job(&api, &context(), &spec_for(temp_dir.path()), NO_WAIT).await;

        assert!(matches!(result, Err(LoadError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_job_done_immediately() {
        let mut api = MockBigQueryJobApi::new();
        api.expect_insert_load_job()
            .withf(|_, job, media| {
                job.destination_label() == "lineage.dbt_model_lineage"
                    && media.as_slice() == b"PAR1fakePAR1"
            })
            .times(1)
            .returning(|_, _, _| Ok(job_with_state("job_1", "DONE", None)));
        api.expect_get_job().never();

        let temp_dir = TempDir::new().unwrap();
        let path = parquet_file(&temp_dir);

        let receipt = run_load_job(&api, &context(), &spec_for(&path), NO_WAIT)
            .await
            .unwrap();

        assert_eq!(receipt.job_id, "job_1");
        assert_eq!(receipt.destination.to_string(), "lineage.dbt_model_lineage");
    }

    #[tokio::test]
    async fn test_job_polled_until_done() {
        let mut seq = Sequence::new();
        let mut api = MockBigQueryJobApi::new();
        api.expect_insert_load_job()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(job_with_state("job_2", "PENDING", None)));
        api.expect_get_job()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(job_with_state("job_2", "RUNNING", None)));
        api.expect_get_job()
            .withf(|_, reference| reference.job_id == "job_2" && reference.location.as_deref() == Some("US"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(job_with_state("job_2", "DONE", None)));

        let temp_dir = TempDir::new().unwrap();
        let path = parquet_file(&temp_dir);

        let receipt = run_load_job(&api, &context(), &spec_for(&path), NO_WAIT)
            .await
            .unwrap();

        assert_eq!(receipt.job_id, "job_2");
    }

    #[tokio::test]
    async fn test_job_schema_mismatch() {
        let mut api = MockBigQueryJobApi::new();
        api.expect_insert_load_job().returning(|_, _, _| {
            Ok(job_with_state(
                "job_3",
                "DONE",
                Some(ErrorProto {
                    reason: "invalid".to_string(),
                    message: "Provided Schema does not match Table my-project:lineage.dbt_model_lineage. Field tags has changed type from STRING to RECORD".to_string(),
                    location: None,
                }),
            ))
        });

        let temp_dir = TempDir::new().unwrap();
        let path = parquet_file(&temp_dir);

        let result = run_load_job(&api, &context(), &spec_for(&path), NO_WAIT).await;

        assert!(
            matches!(result, Err(LoadError::SchemaMismatch { ref table, .. }) if table == "lineage.dbt_model_lineage")
        );
    }

    #[tokio::test]
    async fn test_job_other_failure() {
        let mut api = MockBigQueryJobApi::new();
        api.expect_insert_load_job()
            .returning(|_, _, _| Ok(job_with_state("job_4", "RUNNING", None)));
        api.expect_get_job().returning(|_, _| {
            Ok(job_with_state(
                "job_4",
                "DONE",
                Some(ErrorProto {
                    reason: "quotaExceeded".to_string(),
                    message: "Quota exceeded".to_string(),
                    location: None,
                }),
            ))
        });

        let temp_dir = TempDir::new().unwrap();
        let path = parquet_file(&temp_dir);

        let result = run_load_job(&api, &context(), &spec_for(&path), NO_WAIT).await;

        assert!(
            matches!(result, Err(LoadError::LoadJobFailure { ref message, .. }) if message.contains("quotaExceeded"))
        );
    }

    #[tokio::test]
    async fn test_insert_error_propagates() {
        let mut api = MockBigQueryJobApi::new();
        api.expect_insert_load_job()
            .returning(|_, _, _| Err(LoadError::Authentication("token expired".to_string())));
        api.expect_get_job().never();

        let temp_dir = TempDir::new().unwrap();
        let path = parquet_file(&temp_dir);

        let result = run_load_job(&api, &context(), &spec_for(&path), NO_WAIT).await;

        assert_eq!(
            result.unwrap_err(),
            LoadError::Authentication("token expired".to_string())
        );
    }
}
